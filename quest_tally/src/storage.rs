use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::agnostic::AgnosticComparer;
use crate::builder::Builder;
use crate::config::*;
use crate::partition::{is_plan_voter, VotePartition};
use crate::ranking::RankedVotes;
use crate::vote_line::Marker;

/// A counted unit with the voters supporting it.
#[derive(Debug, Clone)]
pub struct StoredVote {
    pub partition: VotePartition,
    /// Voter -> the marker they used.
    pub supporters: BTreeMap<String, Marker>,
}

impl StoredVote {
    pub fn text(&self) -> String {
        self.partition.text()
    }

    pub fn voters(&self) -> BTreeSet<String> {
        self.supporters.keys().cloned().collect()
    }
}

/// The votes of a tally, per vote type, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct VoteStorage {
    comparer: AgnosticComparer,
    votes: BTreeMap<VoteType, Vec<StoredVote>>,
}

impl VoteStorage {
    pub fn new(comparer: AgnosticComparer) -> VoteStorage {
        VoteStorage {
            comparer,
            votes: BTreeMap::new(),
        }
    }

    pub fn add_support(
        &mut self,
        vote_type: VoteType,
        partition: VotePartition,
        voter: &str,
        marker: Marker,
    ) {
        let stored = self.votes.entry(vote_type).or_default();
        let key = partition.key();
        match stored.iter_mut().find(|v| v.partition.key() == key) {
            Some(existing) => {
                existing.supporters.insert(voter.to_string(), marker);
            }
            None => {
                let mut supporters = BTreeMap::new();
                supporters.insert(voter.to_string(), marker);
                stored.push(StoredVote {
                    partition,
                    supporters,
                });
            }
        }
    }

    pub fn votes(&self, vote_type: VoteType) -> &[StoredVote] {
        self.votes
            .get(&vote_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.votes.values().all(|v| v.is_empty())
    }

    /// Finds a vote by its text, exactly or agnostically.
    pub fn find(&self, vote_type: VoteType, text: &str) -> Option<&StoredVote> {
        self.position(vote_type, text)
            .map(|idx| &self.votes(vote_type)[idx])
    }

    fn position(&self, vote_type: VoteType, text: &str) -> Option<usize> {
        let stored = self.votes(vote_type);
        stored
            .iter()
            .position(|v| v.text() == text)
            .or_else(|| stored.iter().position(|v| self.comparer.equals(&v.text(), text)))
    }

    /// Moves the supporters of `original` to `revised`. Supporters of both keep
    /// their marker on `revised`. Returns false if either vote is missing.
    pub fn merge(&mut self, vote_type: VoteType, original: &str, revised: &str) -> bool {
        let (from, to) = match (
            self.position(vote_type, original),
            self.position(vote_type, revised),
        ) {
            (Some(from), Some(to)) if from != to => (from, to),
            _ => return false,
        };
        let stored = match self.votes.get_mut(&vote_type) {
            Some(stored) => stored,
            None => return false,
        };
        let moved = stored[from].supporters.clone();
        for (voter, marker) in moved {
            stored[to].supporters.entry(voter).or_insert(marker);
        }
        stored.remove(from);
        debug!(
            "VoteStorage::merge: {:?} {:?} -> {:?}",
            vote_type, original, revised
        );
        true
    }

    pub fn remove(&mut self, vote_type: VoteType, text: &str) -> Option<StoredVote> {
        let idx = self.position(vote_type, text)?;
        self.votes.get_mut(&vote_type).map(|v| v.remove(idx))
    }

    /// Replaces a vote by several, each with the same supporters.
    pub fn replace(
        &mut self,
        vote_type: VoteType,
        text: &str,
        parts: Vec<(VoteType, VotePartition)>,
    ) -> bool {
        let removed = match self.remove(vote_type, text) {
            Some(r) => r,
            None => return false,
        };
        for (part_type, partition) in parts {
            for (voter, marker) in removed.supporters.iter() {
                self.add_support(part_type, partition.clone(), voter, *marker);
            }
        }
        true
    }

    /// Every voter with at least one vote, plans included.
    pub fn voters(&self) -> BTreeSet<String> {
        self.votes
            .values()
            .flatten()
            .flat_map(|v| v.supporters.keys().cloned())
            .collect()
    }

    /// The votes of a voter, with the marker they used.
    pub fn voter_support(&self, voter: &str) -> Vec<(VoteType, VotePartition, Marker)> {
        let mut res = Vec::new();
        for (vote_type, stored) in self.votes.iter() {
            for v in stored {
                if let Some(marker) = v.supporters.get(voter) {
                    res.push((*vote_type, v.partition.clone(), *marker));
                }
            }
        }
        res
    }

    /// Removes a voter from every vote, dropping votes left without support.
    pub fn remove_voter(&mut self, voter: &str) {
        for stored in self.votes.values_mut() {
            for v in stored.iter_mut() {
                v.supporters.remove(voter);
            }
            stored.retain(|v| !v.supporters.is_empty());
        }
    }

    /// Vote text -> voters, for one vote type.
    pub fn flat(&self, vote_type: VoteType) -> Vec<(String, BTreeSet<String>)> {
        self.votes(vote_type)
            .iter()
            .map(|v| (v.text(), v.voters()))
            .collect()
    }

    /// Input of the ranked counters, per task. Plans do not rank.
    pub fn ranked_votes(&self) -> BTreeMap<String, RankedVotes> {
        let mut builders: BTreeMap<String, Builder> = BTreeMap::new();
        for v in self.votes(VoteType::Rank) {
            let task = self.task_label(v.partition.task(), builders.keys());
            let option = v.partition.first_line().with_task("").vote_text();
            let builder = builders
                .entry(task)
                .or_insert_with(|| Builder::new(self.comparer));
            for (voter, marker) in v.supporters.iter() {
                if !is_plan_voter(voter) {
                    builder.add_marked(&option, voter, *marker);
                }
            }
        }
        builders
            .into_iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(task, b)| (task, b.build()))
            .collect()
    }

    // Tasks are grouped agnostically under the first spelling seen.
    fn task_label<'a, I>(&self, task: &str, mut known: I) -> String
    where
        I: Iterator<Item = &'a String>,
    {
        known
            .find(|k| self.comparer.equals(k, task))
            .cloned()
            .unwrap_or_else(|| task.to_string())
    }
}
