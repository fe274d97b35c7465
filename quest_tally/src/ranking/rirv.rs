use std::collections::BTreeSet;

use log::debug;

use super::*;

/// Rated instant runoff.
///
/// The two options with the best Wilson scores meet in a runoff where each
/// voter backs the one they ranked better. The runoff winner takes the place
/// and leaves the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RirvCounter;

impl RankedCounter for RirvCounter {
    fn count(&self, votes: &RankedVotes) -> Vec<RankedResult> {
        let mut remaining: BTreeSet<String> = votes.keys().cloned().collect();
        let mut ordered: Vec<(String, f64)> = Vec::new();
        while !remaining.is_empty() {
            let (winner, score) = if remaining.len() == 1 {
                let last = remaining.iter().next().cloned().unwrap_or_default();
                let score = voter_count_of(votes, &last) as f64;
                (last, score)
            } else {
                runoff(votes, &remaining)
            };
            remaining.remove(&winner);
            ordered.push((winner, score));
        }
        to_results(ordered)
    }
}

fn runoff(votes: &RankedVotes, remaining: &BTreeSet<String>) -> (String, f64) {
    let mut by_wilson: Vec<(&String, f64, usize)> = remaining
        .iter()
        .map(|o| (o, wilson_of(votes, o), voter_count_of(votes, o)))
        .collect();
    by_wilson.sort_by(|a, b| {
        desc(a.1, b.1)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| a.0.cmp(b.0))
    });
    let first = by_wilson[0].0;
    let second = by_wilson[1].0;

    let empty = BTreeMap::new();
    let first_ranks = votes.get(first).unwrap_or(&empty);
    let second_ranks = votes.get(second).unwrap_or(&empty);
    let voters: BTreeSet<&String> = first_ranks.keys().chain(second_ranks.keys()).collect();
    let mut first_votes: u32 = 0;
    let mut second_votes: u32 = 0;
    for voter in voters {
        match (first_ranks.get(voter), second_ranks.get(voter)) {
            (Some(a), Some(b)) if a < b => first_votes += 1,
            (Some(a), Some(b)) if b < a => second_votes += 1,
            (Some(_), None) => first_votes += 1,
            (None, Some(_)) => second_votes += 1,
            _ => {}
        }
    }
    debug!(
        "runoff: {:?} {} - {} {:?}",
        first, first_votes, second_votes, second
    );
    // A tied runoff goes to the better rated option.
    if second_votes > first_votes {
        (second.clone(), second_votes as f64)
    } else {
        (first.clone(), first_votes as f64)
    }
}
