//! Scores over rank histograms: a list of (rank, number of voters) pairs.

const MAX_RANK: u32 = 9;
const Z: f64 = 1.96;

fn in_range(rank: u32) -> bool {
    (1..=MAX_RANK).contains(&rank)
}

/// Sum of `(10 - rank) * voters` over the ranks from 1 to 9.
pub fn borda(ranks: &[(u32, usize)]) -> f64 {
    ranks
        .iter()
        .filter(|(rank, _)| in_range(*rank))
        .map(|(rank, count)| ((10 - rank) as f64) * (*count as f64))
        .sum()
}

/// Sum of `voters / rank` over the ranks from 1 to 9.
pub fn inverse_borda(ranks: &[(u32, usize)]) -> f64 {
    ranks
        .iter()
        .filter(|(rank, _)| in_range(*rank))
        .map(|(rank, count)| (*count as f64) / (*rank as f64))
        .sum()
}

/// Lower bound of the Wilson confidence interval of the positive share.
///
/// Rank 1 counts as fully positive and rank 9 as fully negative, linearly in
/// between. Ranks out of range are clamped.
pub fn lower_wilson(ranks: &[(u32, usize)]) -> f64 {
    let mut positive = 0.0;
    let mut negative = 0.0;
    for (rank, count) in ranks {
        let rank = (*rank).clamp(1, MAX_RANK);
        let weight = 1.0 - ((rank - 1) as f64) * 0.125;
        positive += weight * (*count as f64);
        negative += (1.0 - weight) * (*count as f64);
    }
    let n = positive + negative;
    if n <= 0.0 {
        return 0.0;
    }
    let phat = positive / n;
    let z2 = Z * Z;
    (phat + z2 / (2.0 * n) - Z * ((phat * (1.0 - phat) + z2 / (4.0 * n)) / n).sqrt())
        / (1.0 + z2 / n)
}
