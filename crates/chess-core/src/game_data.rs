use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::history::FenPosition;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub event: Option<String>,
    pub link: Option<String>,
    /// Custom starting position from a `SetUp`/`FEN` header pair.
    pub fen: Option<String>,
}

impl GameMetadata {
    /// Which side `username` played in this game, compared case-insensitively.
    pub fn color_of(&self, username: &str) -> Option<Color> {
        let username = username.to_lowercase();
        if self.white.to_lowercase() == username {
            Some(Color::White)
        } else if self.black.to_lowercase() == username {
            Some(Color::Black)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub starting_position: FenPosition,
    pub moves: Vec<String>, // SAN notation
    pub pgn: String,
}

impl GameRecord {
    /// Identifier used to trace moments back to their game: the game link when
    /// the record has one, otherwise a players/date description.
    pub fn game_id(&self) -> String {
        match &self.metadata.link {
            Some(link) => link.clone(),
            None => format!(
                "{} vs {} ({})",
                self.metadata.white,
                self.metadata.black,
                self.metadata.date.as_deref().unwrap_or("????.??.??")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(white: &str, black: &str) -> GameMetadata {
        GameMetadata {
            white: white.to_string(),
            black: black.to_string(),
            result: "*".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_color_of_is_case_insensitive() {
        let meta = metadata("Hikaru", "MagnusCarlsen");
        assert_eq!(meta.color_of("hikaru"), Some(Color::White));
        assert_eq!(meta.color_of("MAGNUSCARLSEN"), Some(Color::Black));
        assert_eq!(meta.color_of("someone_else"), None);
    }

    #[test]
    fn test_game_id_prefers_link() {
        let mut record = GameRecord {
            metadata: metadata("a", "b"),
            starting_position: FenPosition::standard(),
            moves: vec![],
            pgn: String::new(),
        };
        assert_eq!(record.game_id(), "a vs b (????.??.??)");

        record.metadata.link = Some("https://www.chess.com/game/live/1".to_string());
        assert_eq!(record.game_id(), "https://www.chess.com/game/live/1");
    }
}
