//! PGN parsing utilities: lightweight regex-based parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::GameError;
use crate::game_data::{GameMetadata, GameRecord};
use crate::history::FenPosition;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header regex"));
static ANY_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|[O0]-[O0]-[O0][+#]?|[O0]-[O0][+#]?")
        .expect("move regex")
});

/// Parse a single PGN game into a `GameRecord`.
///
/// A `FEN` header sets the starting position unless `SetUp` is explicitly "0".
/// The moves are only extracted here; they are not checked for legality until
/// the record is replayed into a `GameHistory`.
pub fn parse_pgn(pgn: &str) -> Result<GameRecord, GameError> {
    let mut metadata = GameMetadata {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..Default::default()
    };
    let mut setup = None;
    let mut header_count = 0usize;

    for cap in HEADER_RE.captures_iter(pgn) {
        header_count += 1;
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "ECO" => metadata.eco = Some(value),
            "Event" => metadata.event = Some(value),
            "Link" => metadata.link = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => metadata.fen = Some(value),
            _ => {}
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() && header_count == 0 {
        return Err(GameError::MalformedGame(
            "no headers and no moves found".to_string(),
        ));
    }

    let starting_position = match (&metadata.fen, setup.as_deref()) {
        (Some(fen), setup) if setup != Some("0") => FenPosition::parse(fen)
            .map_err(|e| GameError::MalformedGame(e.to_string()))?,
        _ => FenPosition::standard(),
    };

    Ok(GameRecord {
        metadata,
        starting_position,
        moves,
        pgn: pgn.to_string(),
    })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = ANY_HEADER_RE.replace_all(pgn, "");
    let mut text = COMMENT_RE.replace_all(&no_headers, "").into_owned();

    // Variations nest, so strip innermost parentheses until none are left
    loop {
        let stripped = VARIATION_RE.replace_all(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    MOVE_RE
        .find_iter(&text)
        .map(|m| m.as_str().replace('0', "O"))
        .collect()
}

/// Split a multi-game PGN file into the text of each game.
/// A new game starts at every `[Event ` tag line.
pub fn split_games(text: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim_start().starts_with("[Event ") && !current.trim().is_empty() {
            games.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        games.push(current);
    }

    games
}
