//! Ranked-vote counting.
//!
//! Every counter takes the votes of one ranked task, a mapping from option to
//! the rank each of its voters gave it, and returns every option exactly once,
//! at contiguous positions starting from 1. Ties are broken deterministically.

mod baldwin;
mod rirv;
mod schulze;
mod wilson;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub use baldwin::BaldwinCounter;
pub use rirv::RirvCounter;
pub use schulze::SchulzeCounter;
pub use wilson::WilsonCounter;

use crate::config::*;
use crate::scoring;

/// Option -> (voter -> rank).
pub type RankedVotes = BTreeMap<String, BTreeMap<String, u32>>;

/// The voters of one option grouped by the rank they gave it.
pub type RankedVoters = Vec<(u32, BTreeSet<String>)>;

/// Voter -> the (option, rank) pairs of that voter.
pub type VoterRankings = BTreeMap<String, Vec<(String, u32)>>;

pub trait RankedCounter {
    /// Orders the options. An empty input gives an empty output.
    fn count(&self, votes: &RankedVotes) -> Vec<RankedResult>;
}

impl RankVoteCounterMethod {
    pub fn counter(&self) -> Box<dyn RankedCounter> {
        match self {
            RankVoteCounterMethod::Wilson => Box::new(WilsonCounter),
            RankVoteCounterMethod::Baldwin => Box::new(BaldwinCounter),
            RankVoteCounterMethod::Rirv => Box::new(RirvCounter),
            RankVoteCounterMethod::Schulze => Box::new(SchulzeCounter),
        }
    }
}

pub fn ranked_voters(ranks: &BTreeMap<String, u32>) -> RankedVoters {
    let mut by_rank: BTreeMap<u32, BTreeSet<String>> = BTreeMap::new();
    for (voter, rank) in ranks {
        by_rank.entry(*rank).or_default().insert(voter.clone());
    }
    by_rank.into_iter().collect()
}

pub fn voter_rankings(votes: &RankedVotes) -> VoterRankings {
    let mut res: VoterRankings = BTreeMap::new();
    for (option, ranks) in votes {
        for (voter, rank) in ranks {
            res.entry(voter.clone())
                .or_default()
                .push((option.clone(), *rank));
        }
    }
    res
}

/// The (rank, number of voters) histogram the scoring functions work on.
pub(crate) fn histogram(ranks: &BTreeMap<String, u32>) -> Vec<(u32, usize)> {
    ranked_voters(ranks)
        .into_iter()
        .map(|(rank, voters)| (rank, voters.len()))
        .collect()
}

pub(crate) fn wilson_of(votes: &RankedVotes, option: &str) -> f64 {
    votes
        .get(option)
        .map(|ranks| scoring::lower_wilson(&histogram(ranks)))
        .unwrap_or(0.0)
}

pub(crate) fn borda_of(votes: &RankedVotes, option: &str) -> f64 {
    votes
        .get(option)
        .map(|ranks| scoring::borda(&histogram(ranks)))
        .unwrap_or(0.0)
}

pub(crate) fn inverse_borda_of(votes: &RankedVotes, option: &str) -> f64 {
    votes
        .get(option)
        .map(|ranks| scoring::inverse_borda(&histogram(ranks)))
        .unwrap_or(0.0)
}

pub(crate) fn voter_count_of(votes: &RankedVotes, option: &str) -> usize {
    votes.get(option).map(|ranks| ranks.len()).unwrap_or(0)
}

/// Higher first.
pub(crate) fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

pub(crate) fn to_results(ordered: Vec<(String, f64)>) -> Vec<RankedResult> {
    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, (vote, score))| RankedResult {
            rank: idx as u32 + 1,
            score,
            vote,
        })
        .collect()
}
