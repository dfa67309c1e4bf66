//! The position oracle consumed by the search engine and the self-play loop
//!
//! A `Position` is an immutable game state including the side to move. Equality
//! and hashing must cover the full board plus the side to move: the search
//! engine uses them as its transposition key.

use std::fmt::Debug;
use std::hash::Hash;

/// The two roles of a two-player game. White always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// `+1.0` for White, `-1.0` for Black.
    ///
    /// Scores are White-positive; multiplying by this flips them into the
    /// "higher is better for this side" frame.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::White => 1.0,
            Side::Black => -1.0,
        }
    }
}

/// Terminal classification of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    /// Play continues.
    Ongoing,
    /// The game is over and `winner` won it.
    Decisive { winner: Side },
    /// Draw-family outcome (full board, stalemate, repetition...).
    Draw,
}

impl Conclusion {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Conclusion::Ongoing)
    }
}

/// A symmetry variant of a position produced for data augmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Symmetry<P> {
    pub position: P,
    /// When set, the variant swaps the roles of the players and any outcome
    /// label attached to the source position must be negated.
    pub swaps_sides: bool,
}

/// Position oracle for a two-player perfect-information game.
///
/// Implementations must be cheap to clone: the search engine stores one owned
/// copy per explored node.
pub trait Position: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Move type - should be small and Copy
    type Move: Copy + Eq + Debug + Send + Sync + 'static;

    /// Side whose turn it is.
    fn side_to_move(&self) -> Side;

    /// Legal moves in a fixed, deterministic order.
    ///
    /// Must be empty exactly when `conclusion()` is terminal.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Apply a legal move and return the resulting position.
    fn apply(&self, mv: Self::Move) -> Self;

    /// Terminal classification from the board alone.
    fn conclusion(&self) -> Conclusion;

    /// Cheap heuristic balance of the position, positive when White stands better.
    fn static_balance(&self) -> f64;

    /// Whether `mv` resets the quiet-move counter used for progress draws
    /// (captures and pawn pushes in chess). Games without a progress rule keep
    /// the default.
    fn is_irreversible(&self, _mv: Self::Move) -> bool {
        true
    }

    /// Symmetric variants of this position, excluding the identity.
    fn symmetries(&self) -> Vec<Symmetry<Self>> {
        Vec::new()
    }
}
