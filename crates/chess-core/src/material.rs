//! Captured-piece bookkeeping for a replayed game.

use shakmaty::{Color, Role};

use crate::history::PlayedMove;

pub fn piece_value(role: Role) -> u32 {
    match role {
        Role::Pawn => 1,
        Role::Knight | Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}

/// Counts of pieces one side has taken off the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureTally {
    pub pawns: u32,
    pub knights: u32,
    pub bishops: u32,
    pub rooks: u32,
    pub queens: u32,
}

impl CaptureTally {
    fn add(&mut self, role: Role) {
        match role {
            Role::Pawn => self.pawns += 1,
            Role::Knight => self.knights += 1,
            Role::Bishop => self.bishops += 1,
            Role::Rook => self.rooks += 1,
            Role::Queen => self.queens += 1,
            Role::King => {}
        }
    }

    pub fn value(&self) -> u32 {
        self.pawns * piece_value(Role::Pawn)
            + self.knights * piece_value(Role::Knight)
            + self.bishops * piece_value(Role::Bishop)
            + self.rooks * piece_value(Role::Rook)
            + self.queens * piece_value(Role::Queen)
    }
}

/// Material taken by each side over the first `ply` moves of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapturedMaterial {
    /// Black pieces captured by White
    pub by_white: CaptureTally,
    /// White pieces captured by Black
    pub by_black: CaptureTally,
}

impl CapturedMaterial {
    pub fn at_ply(moves: &[PlayedMove], ply: usize) -> Self {
        let mut material = Self::default();
        for mv in moves.iter().take(ply) {
            if let Some(role) = mv.captured {
                match mv.color {
                    Color::White => material.by_white.add(role),
                    Color::Black => material.by_black.add(role),
                }
            }
        }
        material
    }

    /// Positive when White has captured more material than Black.
    pub fn material_balance(&self) -> i32 {
        self.by_white.value() as i32 - self.by_black.value() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{FenPosition, GameHistory};

    #[test]
    fn test_captured_material_by_ply() {
        let moves: Vec<String> = "e4 d5 exd5 Qxd5 Nc3 Qxg2 Bxg2"
            .split_whitespace()
            .map(String::from)
            .collect();
        let history = GameHistory::build(&FenPosition::standard(), &moves).unwrap();

        let start = CapturedMaterial::at_ply(history.moves(), 0);
        assert_eq!(start, CapturedMaterial::default());

        let after_exchange = CapturedMaterial::at_ply(history.moves(), 4);
        assert_eq!(after_exchange.by_white.pawns, 1);
        assert_eq!(after_exchange.by_black.pawns, 1);
        assert_eq!(after_exchange.material_balance(), 0);

        let end = CapturedMaterial::at_ply(history.moves(), 7);
        assert_eq!(end.by_white.queens, 1);
        assert_eq!(end.by_black.pawns, 2);
        assert_eq!(end.material_balance(), 10 - 2);
    }

    #[test]
    fn test_ply_beyond_game_length_counts_everything() {
        let moves: Vec<String> = vec!["e4".into(), "d5".into(), "exd5".into()];
        let history = GameHistory::build(&FenPosition::standard(), &moves).unwrap();
        assert_eq!(CapturedMaterial::at_ply(history.moves(), 99).material_balance(), 1);
    }
}
