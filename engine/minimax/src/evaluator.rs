//! Evaluator trait for leaf scoring.
//!
//! The evaluator scores non-terminal leaves of the exploration graph. Scores
//! are White-positive and finite; ±inf is reserved for decided positions.
//! During training the evaluator is the boosted tree ensemble, optionally
//! summed with the position's static balance.

use engine_core::Position;

/// Trait for position evaluators.
///
/// Implementations could be:
/// - StaticEvaluator: the position's own heuristic balance
/// - a trained tree ensemble over a feature codec
/// - SumEvaluator: two evaluators added together
/// - any `Fn(&P) -> f64` closure
pub trait Evaluator<P>: Send + Sync {
    /// White-positive score of `position`.
    fn evaluate(&self, position: &P) -> f64;
}

impl<P, F> Evaluator<P> for F
where
    F: Fn(&P) -> f64 + Send + Sync,
{
    #[inline]
    fn evaluate(&self, position: &P) -> f64 {
        self(position)
    }
}

/// Scores positions by [`Position::static_balance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticEvaluator;

impl StaticEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl<P: Position> Evaluator<P> for StaticEvaluator {
    #[inline]
    fn evaluate(&self, position: &P) -> f64 {
        position.static_balance()
    }
}

/// Sum of two evaluators.
#[derive(Debug, Clone)]
pub struct SumEvaluator<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> SumEvaluator<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<P, A, B> Evaluator<P> for SumEvaluator<A, B>
where
    A: Evaluator<P>,
    B: Evaluator<P>,
{
    #[inline]
    fn evaluate(&self, position: &P) -> f64 {
        self.first.evaluate(position) + self.second.evaluate(position)
    }
}
