//! Evaluation-bar mapping for White-relative scores.

use crate::score::{NormalizedScore, MATE_THRESHOLD};

/// Scores beyond this are drawn as saturated.
const DISPLAY_CLAMP_CP: i32 = 1000;

/// Logistic steepness: a 100cp swing is clearly visible, 900 vs 1000 is not.
const STEEPNESS: f64 = 0.004;

/// Fraction of the bar filled for White, in `[0, 1]`; 0.5 is equal.
pub fn to_display_fraction(score: NormalizedScore) -> f64 {
    let cp = score.cp();
    if cp > MATE_THRESHOLD {
        return 1.0;
    }
    if cp < -MATE_THRESHOLD {
        return 0.0;
    }
    let clamped = f64::from(cp.clamp(-DISPLAY_CLAMP_CP, DISPLAY_CLAMP_CP));
    1.0 / (1.0 + (-STEEPNESS * clamped).exp())
}

/// `#N` for forced mates, otherwise pawns with one decimal and a sign
/// (`+1.5`, `-2.5`). Small negative scores that round to zero read `0.0`.
pub fn format_score_label(score: NormalizedScore) -> String {
    if let Some(moves) = score.mate_distance() {
        return format!("#{moves}");
    }

    let cp = score.cp();
    // Tenths of a pawn, rounded half away from zero
    let tenths = (cp.abs() + 5) / 10;
    if cp >= 0 {
        format!("+{}.{}", tenths / 10, tenths % 10)
    } else if tenths == 0 {
        "0.0".to_string()
    } else {
        format!("-{}.{}", tenths / 10, tenths % 10)
    }
}
