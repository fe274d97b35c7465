use std::collections::BTreeSet;

use log::debug;

use super::*;

/// Iterative elimination of the weakest option.
///
/// In each round, every voter supports their most preferred remaining options
/// (all of them, if tied). An option supported by a majority wins the round.
/// Otherwise the option with the lowest Wilson score is removed and the round
/// starts again. Once a place is filled, its winner leaves the pool and the
/// next place is counted the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaldwinCounter;

impl RankedCounter for BaldwinCounter {
    fn count(&self, votes: &RankedVotes) -> Vec<RankedResult> {
        let rankings = voter_rankings(votes);
        let mut remaining: BTreeSet<String> = votes.keys().cloned().collect();
        let mut ordered: Vec<(String, f64)> = Vec::new();
        while !remaining.is_empty() {
            let (winner, score) = place_winner(votes, &rankings, &remaining);
            debug!(
                "BaldwinCounter::count: place {}: {:?} ({})",
                ordered.len() + 1,
                winner,
                score
            );
            remaining.remove(&winner);
            ordered.push((winner, score));
        }
        to_results(ordered)
    }
}

fn place_winner(
    votes: &RankedVotes,
    rankings: &VoterRankings,
    remaining: &BTreeSet<String>,
) -> (String, f64) {
    let mut pool: BTreeSet<String> = remaining.clone();
    loop {
        if pool.len() == 1 {
            let last = pool.iter().next().cloned().unwrap_or_default();
            return (last, 1.0);
        }

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        let mut active_voters: u32 = 0;
        for ranks in rankings.values() {
            let best = ranks
                .iter()
                .filter(|(option, _)| pool.contains(option))
                .map(|(_, rank)| *rank)
                .min();
            if let Some(best) = best {
                active_voters += 1;
                for (option, rank) in ranks.iter() {
                    if *rank == best && pool.contains(option) {
                        *counts.entry(option.as_str()).or_insert(0) += 1;
                    }
                }
            }
        }

        let majority = active_voters / 2 + 1;
        let winner = counts
            .iter()
            .filter(|(_, count)| **count >= majority)
            .max_by(|a, b| {
                a.1.cmp(b.1)
                    .then_with(|| wilson_of(votes, a.0).total_cmp(&wilson_of(votes, b.0)))
                    .then_with(|| b.0.cmp(a.0))
            });
        if let Some((option, count)) = winner {
            return (option.to_string(), *count as f64);
        }

        // The weakest option goes: lowest Wilson score, then lowest inverse
        // Borda, then the last one in text order.
        let loser = pool
            .iter()
            .min_by(|a, b| {
                wilson_of(votes, a)
                    .total_cmp(&wilson_of(votes, b))
                    .then_with(|| inverse_borda_of(votes, a).total_cmp(&inverse_borda_of(votes, b)))
                    .then_with(|| b.cmp(a))
            })
            .cloned()
            .unwrap_or_default();
        debug!(
            "place_winner: no majority of {} among {:?}, eliminating {:?}",
            majority, counts, loser
        );
        pool.remove(&loser);
    }
}
