//! Shared utilities for two-player game implementations

use crate::position::{Conclusion, Side};

/// Training label of a finished game, White-positive.
///
/// # Returns
/// * `1.0` if White won
/// * `-1.0` if Black won
/// * `0.0` for draws or games cut short
///
/// # Example
/// ```
/// use engine_core::{outcome_value, Conclusion, Side};
///
/// assert_eq!(outcome_value(Conclusion::Decisive { winner: Side::White }), 1.0);
/// assert_eq!(outcome_value(Conclusion::Decisive { winner: Side::Black }), -1.0);
/// assert_eq!(outcome_value(Conclusion::Draw), 0.0);
/// assert_eq!(outcome_value(Conclusion::Ongoing), 0.0);
/// ```
#[inline]
pub fn outcome_value(conclusion: Conclusion) -> f64 {
    match conclusion {
        Conclusion::Decisive { winner } => winner.sign(),
        Conclusion::Draw | Conclusion::Ongoing => 0.0,
    }
}

/// Fixed search score of a terminal position.
///
/// Decisive results are infinite in the winner's direction; draws score zero.
/// Returns `None` for ongoing positions.
#[inline]
pub fn terminal_score(conclusion: Conclusion) -> Option<f64> {
    match conclusion {
        Conclusion::Ongoing => None,
        Conclusion::Draw => Some(0.0),
        Conclusion::Decisive { winner: Side::White } => Some(f64::INFINITY),
        Conclusion::Decisive { winner: Side::Black } => Some(f64::NEG_INFINITY),
    }
}
