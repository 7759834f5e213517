/// Full-history scans: one White-relative score per position.
mod common;

use std::sync::Arc;

use chess_core::FenPosition;
use coach_engine::{AnalysisError, CancelFlag, NormalizedScore, OracleReply, Progress};
use common::*;

#[tokio::test]
async fn test_scan_scores_every_position() {
    let moves = ["e4", "e5", "Nf3", "Nc6", "Bb5"];
    let game = history(&FenPosition::standard(), &moves);

    // After 1. e4 Black is to move and the engine says +40 for Black
    let oracle = Arc::new(
        ScriptedOracle::new()
            .cp(&game.positions()[0], 30)
            .cp(&game.positions()[1], 40),
    );
    let pipeline = pipeline(oracle.clone(), 100, 3);

    let mut events = Vec::new();
    let mut sink = recorder(&mut events);
    let scores = pipeline.scan_history(game.positions(), &mut sink).await.unwrap();
    drop(sink);

    assert_eq!(scores.len(), moves.len() + 1);
    assert_eq!(scores[0], NormalizedScore::from(30));
    assert_eq!(scores[1], NormalizedScore::from(-40));
    assert!(scores[2..].iter().all(|s| s.cp() == 0));
    assert_eq!(oracle.queried().len(), 6);

    // Evaluations happen in history order
    let expected: Vec<String> = game.positions().iter().map(|p| p.as_str().to_string()).collect();
    assert_eq!(oracle.queried(), expected);

    assert_eq!(
        events,
        vec![
            Progress::Evaluating { current: 1, total: 6 },
            Progress::Evaluating { current: 6, total: 6 },
            Progress::Complete,
        ]
    );
}

#[tokio::test]
async fn test_unresponsive_oracle_scores_neutral() {
    let game = history(&FenPosition::standard(), &["d4", "d5"]);
    let pipeline = pipeline(Arc::new(SleepyOracle), 100, 3);

    let mut events = Vec::new();
    let mut sink = recorder(&mut events);
    let scores = pipeline.scan_history(game.positions(), &mut sink).await.unwrap();
    drop(sink);

    assert_eq!(scores, vec![NormalizedScore::default(); 3]);
    assert_eq!(events.last(), Some(&Progress::Complete));
}

#[tokio::test]
async fn test_custom_start_uses_side_to_move_from_fen() {
    let start =
        FenPosition::parse("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
    let game = history(&start, &["e5", "Nf3"]);

    // Black to move at the start, so +30 for the mover is -30 for White
    let oracle = Arc::new(ScriptedOracle::new().cp(&start, 30).cp(&game.positions()[1], 30));
    let scores = pipeline(oracle, 100, 3)
        .scan_history(game.positions(), &mut |_: Progress| {})
        .await
        .unwrap();

    assert_eq!(scores[0].cp(), -30);
    assert_eq!(scores[1].cp(), 30);
}

#[tokio::test]
async fn test_mate_scores_are_normalized() {
    // Fool's mate: White is checkmated in the final position
    let game = history(&FenPosition::standard(), &["f3", "e5", "g4", "Qh4#"]);
    let positions = game.positions();
    let oracle = Arc::new(
        ScriptedOracle::new()
            .reply(
                &positions[3],
                OracleReply {
                    cp: None,
                    mate: Some(1),
                    best_move: Some("d8h4".to_string()),
                },
            )
            .reply(
                &positions[4],
                OracleReply {
                    cp: None,
                    mate: Some(0),
                    best_move: Some(String::new()),
                },
            ),
    );
    let scores = pipeline(oracle, 100, 3)
        .scan_history(positions, &mut |_: Progress| {})
        .await
        .unwrap();

    // Black mates in 1 from Black's turn; White is mated at the end
    assert_eq!(scores[3].cp(), -29_999);
    assert_eq!(scores[3].mate_distance(), Some(1));
    assert_eq!(scores[4].cp(), -30_000);
    assert!(scores[4].is_mate());
}

#[tokio::test]
async fn test_scan_cancelled_before_start() {
    let game = history(&FenPosition::standard(), &["e4"]);
    let oracle = Arc::new(ScriptedOracle::new());
    let pipeline = pipeline(oracle.clone(), 100, 3);
    pipeline.cancel_flag().cancel();

    let mut events = Vec::new();
    let mut sink = recorder(&mut events);
    let result = pipeline.scan_history(game.positions(), &mut sink).await;
    drop(sink);

    assert!(matches!(result, Err(AnalysisError::Cancelled)));
    assert!(oracle.queried().is_empty());
    assert_eq!(events, vec![Progress::Incomplete]);
}

#[tokio::test]
async fn test_scan_cancelled_midway() {
    let game = history(&FenPosition::standard(), &["e4", "e5", "Nf3", "Nc6"]);
    let flag = CancelFlag::new();
    let oracle = Arc::new(CancellingOracle {
        flag: flag.clone(),
        after: 2,
        calls: Default::default(),
    });
    let pipeline = pipeline(oracle.clone(), 100, 3).with_cancel_flag(flag);

    let mut events = Vec::new();
    let mut sink = recorder(&mut events);
    let result = pipeline.scan_history(game.positions(), &mut sink).await;
    drop(sink);

    assert!(matches!(result, Err(AnalysisError::Cancelled)));
    assert_eq!(*oracle.calls.lock().unwrap(), 2);
    assert_eq!(events.last(), Some(&Progress::Incomplete));
}

#[tokio::test]
async fn test_scan_game_from_pgn() {
    let record = chess_core::pgn::parse_pgn(
        "[White \"alice\"]\n[Black \"bob\"]\n[Link \"https://example.com/game/1\"]\n\n1. e4 d5 2. exd5 Qxd5 *",
    )
    .unwrap();
    let scan = pipeline(Arc::new(ScriptedOracle::new()), 100, 3)
        .scan_game(&record, &mut |_: Progress| {})
        .await
        .unwrap();

    assert_eq!(scan.game_id, "https://example.com/game/1");
    assert_eq!(scan.positions.len(), 5);
    assert_eq!(scan.scores.len(), 5);
    // Pawn for pawn after 2... Qxd5
    assert_eq!(scan.material_balance, vec![0, 0, 0, 1, 0]);
}

#[tokio::test]
async fn test_extreme_oracle_scores_stay_bounded() {
    let game = history(&FenPosition::standard(), &["e4", "e5"]);
    let oracle = Arc::new(
        ScriptedOracle::new()
            .cp(&game.positions()[1], i32::MIN)
            .cp(&game.positions()[2], 2_000_000_000),
    );
    let scores = pipeline(oracle, 100, 3)
        .scan_history(game.positions(), &mut |_: Progress| {})
        .await
        .unwrap();

    // Black to move at +huge: White is far behind, but not mated
    assert_eq!(scores[1].cp(), 29_000);
    assert_eq!(scores[2].cp(), 29_000);
    assert!(scores.iter().all(|s| !s.is_mate()));
}

#[tokio::test]
async fn test_impossible_mate_distance_is_neutral() {
    let game = history(&FenPosition::standard(), &["e4"]);
    let oracle = Arc::new(ScriptedOracle::new().reply(
        &game.positions()[1],
        OracleReply {
            cp: None,
            mate: Some(40_000),
            best_move: Some("e7e5".to_string()),
        },
    ));
    let scores = pipeline(oracle, 100, 3)
        .scan_history(game.positions(), &mut |_: Progress| {})
        .await
        .unwrap();

    assert_eq!(scores[1], NormalizedScore::default());
}
