//! Best single-feature split by total squared error.
//!
//! Two passes over the samples. The first accumulates, per feature, how many
//! samples have it and the sum of their targets. Features present in none or
//! all samples cannot split and are skipped. The second pass walks each
//! sample's sorted feature list with a cursor and adds the squared deviation
//! of its target from the mean of the side it falls on, for every candidate
//! feature at once.

use crate::Sample;

/// A chosen split. Samples with `feature` go left (present side).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub feature: u16,
    pub mean_present: f64,
    pub mean_absent: f64,
    /// Root mean squared error of the split predictor over the samples.
    pub residual_std_dev: f64,
}

/// Find the split over `samples` with the lowest squared error.
///
/// Returns `None` when there are fewer than two samples, the targets are
/// constant, no feature separates the samples, or no split beats the global
/// mean. Ties go to the lowest feature index.
pub fn find_split(max_features: usize, samples: &[Sample<'_>]) -> Option<Split> {
    find_split_in(max_features, samples.iter().copied())
}

pub(crate) fn find_split_in<'a, I>(max_features: usize, samples: I) -> Option<Split>
where
    I: Iterator<Item = Sample<'a>> + Clone,
{
    let mut presence_count = vec![0u32; max_features];
    let mut presence_sum = vec![0.0f64; max_features];
    let mut count = 0u32;
    let mut sum = 0.0;

    for sample in samples.clone() {
        count += 1;
        sum += sample.target;
        for &f in sample.features {
            presence_count[f as usize] += 1;
            presence_sum[f as usize] += sample.target;
        }
    }
    if count < 2 {
        return None;
    }

    let n = count as f64;
    let mean = sum / n;
    let mut best = samples.clone().map(|s| (s.target - mean).powi(2)).sum::<f64>();
    if best == 0.0 {
        return None;
    }

    let candidates: Vec<usize> = (0..max_features)
        .filter(|&f| presence_count[f] > 0 && presence_count[f] < count)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let means: Vec<(f64, f64)> = candidates
        .iter()
        .map(|&f| {
            let present = presence_count[f] as f64;
            (
                presence_sum[f] / present,
                (sum - presence_sum[f]) / (n - present),
            )
        })
        .collect();

    let mut losses = vec![0.0f64; candidates.len()];
    for sample in samples {
        let mut cursor = sample.features.iter().peekable();
        for (slot, &f) in candidates.iter().enumerate() {
            while cursor.next_if(|&&active| (active as usize) < f).is_some() {}
            let present = cursor.next_if(|&&active| active as usize == f).is_some();
            let side_mean = if present { means[slot].0 } else { means[slot].1 };
            losses[slot] += (side_mean - sample.target).powi(2);
        }
    }

    let mut winner = None;
    for (slot, &loss) in losses.iter().enumerate() {
        if loss < best {
            best = loss;
            winner = Some(slot);
        }
    }

    winner.map(|slot| Split {
        feature: candidates[slot] as u16,
        mean_present: means[slot].0,
        mean_absent: means[slot].1,
        residual_std_dev: (best / n).sqrt(),
    })
}
