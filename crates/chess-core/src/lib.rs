//! Game records and board replay shared by the analysis pipeline.
//!
//! Parsing is regex based and deliberately lenient; legality is delegated to
//! shakmaty when the move list is replayed into a position history.

pub mod error;
pub mod game_data;
pub mod history;
pub mod material;
pub mod pgn;

pub use error::GameError;
pub use game_data::{GameMetadata, GameRecord};
pub use history::{FenPosition, GameHistory, PlayedMove};
