//! Manual corrections: the merge ledger and the undo stack.
//!
//! Merges are remembered per partition mode so that they can be applied
//! again on the next tally. Each undo action carries the ledger edge it wrote,
//! which makes undoing a merge remove exactly that edge.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use snafu::ensure;

use crate::config::*;
use crate::storage::VoteStorage;

// Bound on chain length. Cycles are rejected on insert.
const MAX_CHAIN: usize = 10_000;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LedgerEdge {
    pub original: String,
    pub revised: String,
    pub mode: PartitionMode,
}

#[derive(Debug, Clone, Default)]
pub struct MergeRecords {
    records: HashMap<PartitionMode, BTreeMap<String, String>>,
}

impl MergeRecords {
    pub fn new() -> MergeRecords {
        MergeRecords::default()
    }

    /// Records that `original` was merged into `revised`.
    pub fn record_merge(
        &mut self,
        original: &str,
        revised: &str,
        mode: PartitionMode,
    ) -> Result<LedgerEdge, TallyError> {
        ensure!(original != revised, SelfMergeSnafu { vote: original });
        ensure!(
            !self.revisions(revised, mode).iter().any(|v| v == original),
            MergeCycleSnafu { original, revised }
        );
        debug!("record_merge: {:?}: {:?} -> {:?}", mode, original, revised);
        self.records
            .entry(mode)
            .or_default()
            .insert(original.to_string(), revised.to_string());
        Ok(LedgerEdge {
            original: original.to_string(),
            revised: revised.to_string(),
            mode,
        })
    }

    /// The final revision of a vote, if it was ever merged.
    pub fn resolve(&self, vote: &str, mode: PartitionMode) -> Option<String> {
        self.revisions(vote, mode).pop()
    }

    /// Every revision reached from `vote`, in order.
    pub fn revisions(&self, vote: &str, mode: PartitionMode) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        let records = match self.records.get(&mode) {
            Some(r) => r,
            None => return res,
        };
        let mut current = vote;
        while let Some(next) = records.get(current) {
            assert!(res.len() < MAX_CHAIN, "merge chain too long at {:?}", vote);
            res.push(next.clone());
            current = next;
        }
        res
    }

    /// Removes the edge from `original` only if it still points to `revised`.
    pub fn remove_merge(&mut self, original: &str, revised: &str, mode: PartitionMode) -> bool {
        match self.records.get_mut(&mode) {
            Some(records) if records.get(original).map(|r| r == revised).unwrap_or(false) => {
                records.remove(original);
                true
            }
            _ => false,
        }
    }

    pub fn records(&self, mode: PartitionMode) -> Vec<(String, String)> {
        self.records
            .get(&mode)
            .map(|r| r.iter().map(|(a, b)| (a.clone(), b.clone())).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.values().all(|r| r.is_empty())
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// One correction, with the state of the votes before it was applied.
#[derive(Debug, Clone)]
pub enum UndoAction {
    Merge {
        vote_type: VoteType,
        original: String,
        revised: String,
        snapshot: VoteStorage,
        edge: LedgerEdge,
    },
    Join {
        voter: String,
        joined: String,
        snapshot: VoteStorage,
    },
    Delete {
        vote_type: VoteType,
        vote: String,
        snapshot: VoteStorage,
    },
    PartitionChildren {
        vote_type: VoteType,
        vote: String,
        snapshot: VoteStorage,
    },
}

impl UndoAction {
    pub fn into_snapshot(self) -> VoteStorage {
        match self {
            UndoAction::Merge { snapshot, .. }
            | UndoAction::Join { snapshot, .. }
            | UndoAction::Delete { snapshot, .. }
            | UndoAction::PartitionChildren { snapshot, .. } => snapshot,
        }
    }

    pub fn ledger_edge(&self) -> Option<&LedgerEdge> {
        match self {
            UndoAction::Merge { edge, .. } => Some(edge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    actions: Vec<UndoAction>,
}

impl UndoStack {
    pub fn new() -> UndoStack {
        UndoStack::default()
    }

    pub fn push(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    pub fn pop(&mut self) -> Option<UndoAction> {
        self.actions.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Pops the last action and removes the ledger edge it recorded.
    pub fn undo(&mut self, ledger: &mut MergeRecords) -> Option<UndoAction> {
        let action = self.pop()?;
        if let Some(edge) = action.ledger_edge() {
            let removed = ledger.remove_merge(&edge.original, &edge.revised, edge.mode);
            debug!("UndoStack::undo: edge {:?} removed: {}", edge, removed);
        }
        Some(action)
    }
}
