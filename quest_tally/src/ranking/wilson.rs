use log::debug;

use super::*;

/// Orders options by the lower bound of their Wilson score.
///
/// Ties go to the option with more voters, then the higher Borda count, then
/// the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct WilsonCounter;

impl RankedCounter for WilsonCounter {
    fn count(&self, votes: &RankedVotes) -> Vec<RankedResult> {
        let mut scored: Vec<(String, f64, usize, f64)> = votes
            .keys()
            .map(|option| {
                (
                    option.clone(),
                    wilson_of(votes, option),
                    voter_count_of(votes, option),
                    borda_of(votes, option),
                )
            })
            .collect();
        scored.sort_by(|a, b| {
            desc(a.1, b.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| desc(a.3, b.3))
                .then_with(|| a.0.cmp(&b.0))
        });
        debug!("WilsonCounter::count: {:?}", scored);
        to_results(
            scored
                .into_iter()
                .map(|(option, score, _, _)| (option, score))
                .collect(),
        )
    }
}
