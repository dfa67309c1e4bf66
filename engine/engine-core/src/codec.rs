//! Sparse feature encoding of positions

use crate::position::Position;

/// Maps a position to the ascending, duplicate-free list of its active boolean
/// features.
///
/// Encoders are pure and stateless. `max_active` is an upper bound on the
/// length of any encoding and is used to size buffers up front.
pub trait FeatureCodec<P: Position>: Send + Sync {
    /// Number of distinct features; every index is below this.
    fn feature_count(&self) -> usize;

    /// Largest number of features active in a single position.
    fn max_active(&self) -> usize;

    /// Append the active features of `position` to `out` in ascending order.
    ///
    /// `out` is cleared first.
    fn encode(&self, position: &P, out: &mut Vec<u16>);

    /// Dense byte rendition: one byte per feature, `1` when active.
    fn encode_dense(&self, position: &P, out: &mut Vec<u8>) {
        let mut sparse = Vec::with_capacity(self.max_active());
        self.encode(position, &mut sparse);
        out.clear();
        out.resize(self.feature_count(), 0);
        for f in sparse {
            out[f as usize] = 1;
        }
    }

    /// Convenience wrapper returning a fresh vector.
    fn features(&self, position: &P) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.max_active());
        self.encode(position, &mut out);
        out
    }
}

/// True when `features` is strictly ascending (sorted with no duplicates).
#[inline]
pub fn is_strictly_ascending(features: &[u16]) -> bool {
    features.windows(2).all(|w| w[0] < w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_ascending() {
        assert!(is_strictly_ascending(&[]));
        assert!(is_strictly_ascending(&[3]));
        assert!(is_strictly_ascending(&[0, 1, 5, 90]));
        assert!(!is_strictly_ascending(&[0, 0]));
        assert!(!is_strictly_ascending(&[4, 2]));
    }
}
