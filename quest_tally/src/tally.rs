//! The tally session: a full pass over the posts of a quest, and the manual
//! corrections that can be applied to its results.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

use crate::agnostic::AgnosticComparer;
use crate::config::*;
use crate::ledger::{MergeRecords, UndoAction, UndoStack};
use crate::partition::{
    label_lines, promote, split_blocks, PartitionContext, Plan, PlanRegistry, PlanType,
    VotePartition, VoterNames,
};
use crate::post::{parse_post, LineFailure, Post, PostVote};
use crate::ranking::RankedCounter;
use crate::storage::VoteStorage;
use crate::vote_line::{ParseOptions, VoteLine};
use crate::vote_node::{build_nodes, VoteNode};

/// Cooperative cancellation of a running tally. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

fn check(cancel: &CancellationToken) -> Result<(), TallyError> {
    ensure!(!cancel.is_cancelled(), CancelledSnafu {});
    Ok(())
}

/// A line that could not be read, with the post it came from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PostFailure {
    pub author: String,
    pub post_id: u64,
    pub failure: LineFailure,
}

#[derive(Debug, Clone)]
pub struct TallyResults {
    pub storage: VoteStorage,
    /// Task -> vote trees, for plain votes and plans.
    pub nodes: BTreeMap<String, Vec<VoteNode>>,
    /// Task -> ordered outcome, for ranked votes.
    pub ranked: BTreeMap<String, Vec<RankedResult>>,
    /// Voter -> post id of the vote that was counted.
    pub voters: BTreeMap<String, u64>,
    pub plans: Vec<Plan>,
    pub failures: Vec<PostFailure>,
}

impl TallyResults {
    /// Vote text -> voters, for one vote type.
    pub fn flat(&self, vote_type: VoteType) -> Vec<(String, BTreeSet<String>)> {
        self.storage.flat(vote_type)
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }
}

pub struct Tally {
    options: QuestOptions,
    comparer: AgnosticComparer,
    ledger: MergeRecords,
    undo: UndoStack,
    plans: PlanRegistry,
    results: Option<TallyResults>,
}

impl Tally {
    pub fn new(options: &QuestOptions) -> Tally {
        let comparer = AgnosticComparer::for_config(options.comparison);
        Tally {
            options: options.clone(),
            comparer,
            ledger: MergeRecords::new(),
            undo: UndoStack::new(),
            plans: PlanRegistry::new(comparer),
            results: None,
        }
    }

    pub fn options(&self) -> &QuestOptions {
        &self.options
    }

    /// Changing the options drops the results and the undo history.
    ///
    /// The merge ledger is kept per partition mode, so it survives a change of
    /// mode or counter. A new comparison invalidates every recorded vote text
    /// and resets everything.
    pub fn set_options(&mut self, options: &QuestOptions) {
        let comparison_changed = options.comparison != self.options.comparison;
        self.options = options.clone();
        if comparison_changed {
            self.comparer = AgnosticComparer::for_config(options.comparison);
            self.reset();
        } else {
            self.undo.clear();
            self.results = None;
        }
    }

    pub fn results(&self) -> Option<&TallyResults> {
        self.results.as_ref()
    }

    pub fn ledger(&self) -> &MergeRecords {
        &self.ledger
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Drops the results, the corrections and their history.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.undo.clear();
        self.plans = PlanRegistry::new(self.comparer);
        self.results = None;
    }

    /// Tallies the posts of a quest.
    ///
    /// Posts are taken in thread order and the last vote of each voter counts.
    /// Merges recorded by earlier corrections are applied again. A cancelled
    /// run leaves the previous results in place.
    pub fn run(
        &mut self,
        posts: &[Post],
        cancel: &CancellationToken,
    ) -> Result<&TallyResults, TallyError> {
        info!(
            "Tally::run: {} posts, options: {:?}",
            posts.len(),
            self.options
        );
        let parse_options = ParseOptions {
            comparer: self.comparer,
            trim_extended_text: self.options.trim_extended_text,
        };
        let mut ordered: Vec<&Post> = posts.iter().collect();
        ordered.sort_by_key(|p| (p.number, p.post_id));

        let mut post_votes: Vec<PostVote> = Vec::new();
        let mut failures: Vec<PostFailure> = Vec::new();
        for post in ordered {
            check(cancel)?;
            if post.is_tally_post() {
                debug!("Tally::run: skipping tally post {}", post.post_id);
                continue;
            }
            let pv = parse_post(post, &parse_options);
            failures.extend(pv.failures.iter().map(|f| PostFailure {
                author: pv.author.clone(),
                post_id: pv.post_id,
                failure: f.clone(),
            }));
            if !pv.is_empty() {
                post_votes.push(pv);
            }
        }
        if !failures.is_empty() {
            warn!("Tally::run: {} unreadable vote lines", failures.len());
        }

        let mut voter_names = VoterNames::new(self.comparer);
        for pv in post_votes.iter() {
            voter_names.insert(&pv.author);
        }

        let mut plans = PlanRegistry::new(self.comparer);
        let mut label_posts: HashSet<u64> = HashSet::new();
        let found: Vec<Plan> = {
            let ctx = self.context(&plans, &voter_names);
            let mut found = Vec::new();
            for pv in post_votes.iter() {
                check(cancel)?;
                for plan in ctx.plans_in_post(pv) {
                    if plan.plan_type == PlanType::Label {
                        label_posts.insert(pv.post_id);
                    }
                    found.push(plan);
                }
            }
            found
        };
        for plan in found {
            plans.add(plan);
        }
        info!("Tally::run: {} plans", plans.plans().len());

        let ctx = self.context(&plans, &voter_names);
        let mut prior: HashMap<String, Vec<VoteLine>> = HashMap::new();
        let mut final_votes: Vec<(String, u64, Vec<VoteLine>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for pv in post_votes.iter() {
            check(cancel)?;
            let lines = if label_posts.contains(&pv.post_id) {
                label_lines(&pv.lines)
            } else {
                pv.lines.clone()
            };
            let expanded = ctx.expand_references(&lines, &pv.author, &prior);
            let key = self.comparer.fold(&pv.author);
            prior.insert(key.clone(), expanded.clone());
            let entry = (pv.author.clone(), pv.post_id, expanded);
            match positions.get(&key) {
                Some(idx) => final_votes[*idx] = entry,
                None => {
                    positions.insert(key, final_votes.len());
                    final_votes.push(entry);
                }
            }
        }

        let mut storage = VoteStorage::new(self.comparer);
        let mut voters: BTreeMap<String, u64> = BTreeMap::new();
        for (author, post_id, lines) in final_votes {
            for (vote_type, partition) in ctx.partition(&lines) {
                let marker = partition.first_line().marker();
                storage.add_support(vote_type, partition, &author, marker);
            }
            voters.insert(author, post_id);
        }
        for plan in plans.plans() {
            check(cancel)?;
            let name = plan.voter_name();
            for (vote_type, partition) in ctx.partition(plan.content.lines()) {
                let marker = partition.first_line().marker();
                storage.add_support(vote_type, partition, &name, marker);
            }
        }

        self.replay_merges(&mut storage);

        let summary = self.summarize(storage, &plans, voters, failures, cancel)?;
        info!(
            "Tally::run: {} voters, {} tasks, {} ranked tasks",
            summary.voters.len(),
            summary.nodes.len(),
            summary.ranked.len()
        );
        self.undo.clear();
        self.plans = plans;
        Ok(&*self.results.insert(summary))
    }

    // Merges go to the furthest revision that is still voted for.
    fn replay_merges(&self, storage: &mut VoteStorage) {
        let mode = self.options.partition_mode;
        for (original, _) in self.ledger.records(mode) {
            let revisions = self.ledger.revisions(&original, mode);
            for vote_type in VoteType::ALL {
                if storage.find(vote_type, &original).is_none() {
                    continue;
                }
                match revisions
                    .iter()
                    .rev()
                    .find(|r| storage.find(vote_type, r).is_some())
                {
                    Some(target) => {
                        storage.merge(vote_type, &original, target);
                    }
                    None => debug!(
                        "replay_merges: {:?}: no revision of {:?} left, skipping",
                        vote_type, original
                    ),
                }
            }
        }
    }

    fn context<'a>(
        &self,
        plans: &'a PlanRegistry,
        voters: &'a VoterNames,
    ) -> PartitionContext<'a> {
        PartitionContext {
            comparer: self.comparer,
            mode: self.options.partition_mode,
            plans,
            voters,
            forbid_plan_voter_names: self.options.forbid_plan_voter_names,
        }
    }

    // Derives the node trees and the ranked outcomes from the stored votes.
    fn summarize(
        &self,
        storage: VoteStorage,
        plans: &PlanRegistry,
        voters: BTreeMap<String, u64>,
        failures: Vec<PostFailure>,
        cancel: &CancellationToken,
    ) -> Result<TallyResults, TallyError> {
        let mut post_ids: HashMap<String, u64> =
            voters.iter().map(|(v, id)| (v.clone(), *id)).collect();
        for plan in plans.plans() {
            post_ids.insert(plan.voter_name(), plan.post_id);
        }

        let mut by_task: Vec<(String, Vec<(VotePartition, BTreeSet<String>)>)> = Vec::new();
        for vote_type in [VoteType::Vote, VoteType::Plan] {
            for v in storage.votes(vote_type) {
                let task = v.partition.task();
                let entry = (v.partition.clone(), v.voters());
                match by_task
                    .iter_mut()
                    .find(|(t, _)| self.comparer.equals(t, task))
                {
                    Some((_, votes)) => votes.push(entry),
                    None => by_task.push((task.to_string(), vec![entry])),
                }
            }
        }
        let mut nodes: BTreeMap<String, Vec<VoteNode>> = BTreeMap::new();
        for (task, votes) in by_task {
            check(cancel)?;
            nodes.insert(task, build_nodes(&votes, plans, &post_ids));
        }

        let counter = self.options.rank_counter.counter();
        let mut ranked: BTreeMap<String, Vec<RankedResult>> = BTreeMap::new();
        for (task, votes) in storage.ranked_votes() {
            check(cancel)?;
            debug!("summarize: ranking {} options of task {:?}", votes.len(), task);
            ranked.insert(task, counter.count(&votes));
        }

        Ok(TallyResults {
            storage,
            nodes,
            ranked,
            voters,
            plans: plans.plans().to_vec(),
            failures,
        })
    }

    fn current(&self) -> Result<&TallyResults, TallyError> {
        self.results.as_ref().context(NoResultsSnafu {})
    }

    // Replaces the stored votes of the current results and derives the rest again.
    fn apply(&mut self, storage: VoteStorage) -> Result<(), TallyError> {
        let current = self.current()?;
        let voters = current.voters.clone();
        let failures = current.failures.clone();
        let summary = self.summarize(
            storage,
            &self.plans,
            voters,
            failures,
            &CancellationToken::new(),
        )?;
        self.results = Some(summary);
        Ok(())
    }

    fn find_text(&self, vote_type: VoteType, vote: &str) -> Result<String, TallyError> {
        self.current()?
            .storage
            .find(vote_type, vote)
            .map(|v| v.text())
            .context(VoteNotFoundSnafu { vote, vote_type })
    }

    /// Merges the supporters of `original` into `revised`.
    ///
    /// The merge is recorded in the ledger and applied again on later runs.
    pub fn merge_votes(
        &mut self,
        vote_type: VoteType,
        original: &str,
        revised: &str,
    ) -> Result<(), TallyError> {
        let from = self.find_text(vote_type, original)?;
        let to = self.find_text(vote_type, revised)?;
        ensure!(from != to, SelfMergeSnafu { vote: original });
        let edge = self
            .ledger
            .record_merge(&from, &to, self.options.partition_mode)?;
        let snapshot = self.current()?.storage.clone();
        let mut storage = snapshot.clone();
        storage.merge(vote_type, &from, &to);
        self.undo.push(UndoAction::Merge {
            vote_type,
            original: from,
            revised: to,
            snapshot,
            edge,
        });
        self.apply(storage)
    }

    /// Makes `voter` support exactly what `joined` supports.
    pub fn join_voters(&mut self, voter: &str, joined: &str) -> Result<(), TallyError> {
        let snapshot = self.current()?.storage.clone();
        let all = snapshot.voters();
        let find = |name: &str| {
            all.iter()
                .find(|v| self.comparer.equals(v, name))
                .cloned()
                .context(VoterNotFoundSnafu { voter: name })
        };
        let voter = find(voter)?;
        let joined = find(joined)?;
        ensure!(voter != joined, SelfMergeSnafu { vote: voter });

        let mut storage = snapshot.clone();
        storage.remove_voter(&voter);
        for (vote_type, partition, marker) in storage.voter_support(&joined) {
            storage.add_support(vote_type, partition, &voter, marker);
        }
        debug!("join_voters: {} now votes with {}", voter, joined);
        self.undo.push(UndoAction::Join {
            voter,
            joined,
            snapshot,
        });
        self.apply(storage)
    }

    pub fn delete_vote(&mut self, vote_type: VoteType, vote: &str) -> Result<(), TallyError> {
        let text = self.find_text(vote_type, vote)?;
        let snapshot = self.current()?.storage.clone();
        let mut storage = snapshot.clone();
        storage.remove(vote_type, &text);
        self.undo.push(UndoAction::Delete {
            vote_type,
            vote: text,
            snapshot,
        });
        self.apply(storage)
    }

    /// Splits a multi-line vote into its first line and the blocks below it.
    /// Every supporter of the vote supports each part.
    pub fn partition_children(
        &mut self,
        vote_type: VoteType,
        vote: &str,
    ) -> Result<(), TallyError> {
        let text = self.find_text(vote_type, vote)?;
        let snapshot = self.current()?.storage.clone();
        let parts = match snapshot.find(vote_type, &text) {
            Some(stored) if stored.partition.line_count() > 1 => {
                let lines = stored.partition.lines();
                let first = &lines[0];
                let child_type = match vote_type {
                    VoteType::Plan => VoteType::Vote,
                    other => other,
                };
                let children: Vec<VoteLine> = lines[1..]
                    .iter()
                    .map(|l| promote(l, first.task(), l.depth().saturating_sub(1)))
                    .collect();
                let mut parts = vec![(vote_type, VotePartition::new(vec![first.clone()]))];
                for block in split_blocks(&children) {
                    parts.push((child_type, VotePartition::new(block)));
                }
                parts
            }
            _ => return NothingToPartitionSnafu { vote: text }.fail(),
        };
        let mut storage = snapshot.clone();
        storage.replace(vote_type, &text, parts);
        self.undo.push(UndoAction::PartitionChildren {
            vote_type,
            vote: text,
            snapshot,
        });
        self.apply(storage)
    }

    /// Reverts the last correction. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, TallyError> {
        self.current()?;
        match self.undo.undo(&mut self.ledger) {
            Some(action) => {
                debug!("Tally::undo: {:?}", action_name(&action));
                self.apply(action.into_snapshot())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn action_name(action: &UndoAction) -> &'static str {
    match action {
        UndoAction::Merge { .. } => "merge",
        UndoAction::Join { .. } => "join",
        UndoAction::Delete { .. } => "delete",
        UndoAction::PartitionChildren { .. } => "partition children",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agnostic::ComparisonConfig;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn post(author: &str, id: u64, text: &str) -> Post {
        Post::new(author, id, id as u32, text).unwrap()
    }

    fn run(options: &QuestOptions, posts: &[Post]) -> Tally {
        let mut tally = Tally::new(options);
        tally.run(posts, &CancellationToken::new()).unwrap();
        tally
    }

    fn flat_counts(tally: &Tally, vote_type: VoteType) -> Vec<(String, usize)> {
        tally
            .results()
            .unwrap()
            .flat(vote_type)
            .into_iter()
            .map(|(text, voters)| (text, voters.len()))
            .collect()
    }

    #[test]
    fn equivalent_lines_are_one_vote() {
        init();
        let posts = vec![
            post("A", 1, "- - [x] [How?] A line"),
            post("B", 2, "--[X][how?] a line "),
        ];
        let tally = run(&QuestOptions::DEFAULT, &posts);
        assert_eq!(flat_counts(&tally, VoteType::Vote).len(), 1);

        let options = QuestOptions {
            comparison: ComparisonConfig {
                case_sensitive: true,
                symbols_significant: false,
            },
            ..QuestOptions::DEFAULT
        };
        let tally = run(&options, &posts);
        assert_eq!(flat_counts(&tally, VoteType::Vote).len(), 2);
    }

    #[test]
    fn last_vote_of_a_voter_counts() {
        let posts = vec![
            post("A", 1, "[x] North"),
            post("B", 2, "[x] North"),
            post("A", 3, "[x] South"),
            post("Nobody", 4, "Just chatting"),
        ];
        let tally = run(&QuestOptions::DEFAULT, &posts);
        let results = tally.results().unwrap();
        assert_eq!(
            flat_counts(&tally, VoteType::Vote),
            vec![("South".to_string(), 1), ("North".to_string(), 1)]
        );
        assert_eq!(results.voters["A"], 3);
        assert_eq!(results.voter_count(), 2);
    }

    #[test]
    fn tally_posts_are_skipped() {
        let posts = vec![
            post("A", 1, "[x] North"),
            post("Bot", 2, "##### Tally\n[x] North"),
        ];
        let tally = run(&QuestOptions::DEFAULT, &posts);
        assert_eq!(flat_counts(&tally, VoteType::Vote), vec![("North".to_string(), 1)]);
    }

    #[test]
    fn plans_and_references() {
        init();
        let posts = vec![
            post("Bob", 1, "[x] Plan Dragon\n-[x] Sharpen swords\n-[x] Attack"),
            post("Carol", 2, "[x] Plan Dragon"),
            post("Dave", 3, "[x] Bob"),
            post("Erin", 4, "[x] Sleep"),
        ];
        let tally = run(&QuestOptions::DEFAULT, &posts);
        let results = tally.results().unwrap();
        assert_eq!(results.plans.len(), 1);
        let plan_votes = results.flat(VoteType::Plan);
        assert_eq!(plan_votes.len(), 1);
        assert_eq!(plan_votes[0].1.len(), 4);
        let nodes = &results.nodes[""];
        assert_eq!(nodes[0].text, "Plan Dragon");
        assert_eq!(nodes[0].voter_count(), 3);
        assert_eq!(nodes[1].text, "Sleep");
    }

    #[test]
    fn label_plans_take_the_whole_post() {
        let posts = vec![
            post("Bob", 1, "[x] Plan Quiet\n[x] Rest\n[x] Read"),
            post("Carol", 2, "[x] plan quiet"),
        ];
        let tally = run(&QuestOptions::DEFAULT, &posts);
        let results = tally.results().unwrap();
        assert_eq!(results.plans[0].plan_type, PlanType::Label);
        let plan_votes = results.flat(VoteType::Plan);
        assert_eq!(plan_votes.len(), 1);
        assert_eq!(plan_votes[0].0, "Plan Quiet\n-Rest\n-Read");
        assert!(results.flat(VoteType::Vote).is_empty());
    }

    #[test]
    fn impersonating_plans_become_proxies() {
        let posts = vec![
            post("Bob", 1, "[x] Fight"),
            post("Mallory", 2, "[x] Plan Bob\n-[x] Run away"),
            post("Carol", 3, "[x] Plan Bob"),
        ];
        let tally = run(&QuestOptions::DEFAULT, &posts);
        let results = tally.results().unwrap();
        assert!(results.plans.is_empty());
        let votes = flat_counts(&tally, VoteType::Vote);
        assert!(votes.contains(&("Fight".to_string(), 2)), "{:?}", votes);
    }

    #[test]
    fn ranked_tasks_are_counted() {
        let posts = vec![
            post("voter1", 1, "[1][Fruit] Apple\n[2][Fruit] Banana"),
            post("voter2", 2, "[1][Fruit] Banana\n[2][Fruit] Apple"),
            post("voter3", 3, "[1][Fruit] Cherry\n[2][Fruit] Apple"),
        ];
        let options = QuestOptions {
            rank_counter: RankVoteCounterMethod::Schulze,
            ..QuestOptions::DEFAULT
        };
        let tally = run(&options, &posts);
        let fruit = &tally.results().unwrap().ranked["Fruit"];
        let order: Vec<&str> = fruit.iter().map(|r| r.vote.as_str()).collect();
        assert_eq!(order, vec!["Apple", "Banana", "Cherry"]);
    }

    #[test]
    fn no_votes_is_not_an_error() {
        let tally = run(&QuestOptions::DEFAULT, &[post("A", 1, "Nothing here")]);
        let results = tally.results().unwrap();
        assert!(results.ranked.is_empty());
        assert!(results.nodes.is_empty());
        assert!(results.storage.is_empty());
    }

    #[test]
    fn cancelled_runs_keep_previous_results() {
        let mut tally = Tally::new(&QuestOptions::DEFAULT);
        tally
            .run(&[post("A", 1, "[x] North")], &CancellationToken::new())
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.clone().cancel();
        let res = tally.run(&[post("B", 2, "[x] South")], &cancel);
        assert!(matches!(res, Err(TallyError::Cancelled {})));
        assert_eq!(
            flat_counts(&tally, VoteType::Vote),
            vec![("North".to_string(), 1)]
        );
    }

    #[test]
    fn corrections_need_results() {
        let mut tally = Tally::new(&QuestOptions::DEFAULT);
        assert_eq!(
            tally.merge_votes(VoteType::Vote, "a", "b"),
            Err(TallyError::NoResults {})
        );
        assert_eq!(tally.undo(), Err(TallyError::NoResults {}));
    }

    #[test]
    fn merges_survive_a_new_run_and_undo() {
        let posts = vec![
            post("A", 1, "[x] Go north"),
            post("B", 2, "[x] Head north"),
            post("C", 3, "[x] Go south"),
        ];
        let mut tally = run(&QuestOptions::DEFAULT, &posts);
        assert!(matches!(
            tally.merge_votes(VoteType::Vote, "Go north", "Go north!"),
            Err(TallyError::SelfMerge { .. })
        ));
        assert!(matches!(
            tally.merge_votes(VoteType::Vote, "Go west", "Go north"),
            Err(TallyError::VoteNotFound { .. })
        ));
        tally
            .merge_votes(VoteType::Vote, "Head north", "Go north")
            .unwrap();
        assert_eq!(flat_counts(&tally, VoteType::Vote)[0], ("Go north".to_string(), 2));

        tally.run(&posts, &CancellationToken::new()).unwrap();
        assert_eq!(flat_counts(&tally, VoteType::Vote).len(), 2);
        assert!(!tally.can_undo());

        tally.merge_votes(VoteType::Vote, "Go south", "Go north").unwrap();
        assert_eq!(flat_counts(&tally, VoteType::Vote).len(), 1);
        assert!(tally.undo().unwrap());
        assert_eq!(flat_counts(&tally, VoteType::Vote).len(), 2);
        assert_eq!(
            tally.ledger().resolve("Go south", PartitionMode::ByBlock),
            None
        );
        assert_eq!(
            tally.ledger().resolve("Head north", PartitionMode::ByBlock),
            Some("Go north".to_string())
        );
        assert!(!tally.undo().unwrap());

        tally.reset();
        assert!(tally.ledger().is_empty());
        assert!(tally.results().is_none());
    }

    #[test]
    fn join_delete_and_partition() {
        let posts = vec![
            post("A", 1, "[x] Build\n-[x] Walls\n-[x] Towers"),
            post("B", 2, "[x] Rest"),
        ];
        let mut tally = run(&QuestOptions::DEFAULT, &posts);

        tally.join_voters("b", "A").unwrap();
        assert_eq!(
            flat_counts(&tally, VoteType::Vote),
            vec![("Build\n-Walls\n-Towers".to_string(), 2)]
        );
        assert!(matches!(
            tally.join_voters("Zed", "A"),
            Err(TallyError::VoterNotFound { .. })
        ));

        tally
            .partition_children(VoteType::Vote, "Build\n-Walls\n-Towers")
            .unwrap();
        let texts: Vec<String> = flat_counts(&tally, VoteType::Vote)
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        assert_eq!(texts, vec!["Build", "Walls", "Towers"]);
        assert!(matches!(
            tally.partition_children(VoteType::Vote, "Walls"),
            Err(TallyError::NothingToPartition { .. })
        ));

        tally.delete_vote(VoteType::Vote, "walls").unwrap();
        assert_eq!(flat_counts(&tally, VoteType::Vote).len(), 2);

        assert!(tally.undo().unwrap());
        assert!(tally.undo().unwrap());
        assert!(tally.undo().unwrap());
        assert_eq!(
            flat_counts(&tally, VoteType::Vote),
            vec![
                ("Build\n-Walls\n-Towers".to_string(), 1),
                ("Rest".to_string(), 1)
            ]
        );
    }

    #[test]
    fn merges_fall_back_to_a_remaining_revision() {
        init();
        let posts = vec![
            post("A", 1, "[x] Go north"),
            post("B", 2, "[x] Head north"),
            post("C", 3, "[x] North"),
        ];
        let mut tally = run(&QuestOptions::DEFAULT, &posts);
        tally.merge_votes(VoteType::Vote, "Head north", "North").unwrap();
        tally.merge_votes(VoteType::Vote, "North", "Go north").unwrap();
        assert_eq!(
            flat_counts(&tally, VoteType::Vote),
            vec![("Go north".to_string(), 3)]
        );

        tally
            .run(&posts[1..], &CancellationToken::new())
            .unwrap();
        assert_eq!(
            flat_counts(&tally, VoteType::Vote),
            vec![("North".to_string(), 2)]
        );
    }

    #[test]
    fn mode_change_keeps_the_ledger() {
        let posts = vec![
            post("A", 1, "[x] Go north"),
            post("B", 2, "[x] Head north"),
            post("C", 3, "[x] Go south"),
        ];
        let by_line = QuestOptions {
            partition_mode: PartitionMode::ByLine,
            ..QuestOptions::DEFAULT
        };
        let mut tally = run(&QuestOptions::DEFAULT, &posts);
        tally
            .merge_votes(VoteType::Vote, "Head north", "Go north")
            .unwrap();

        tally.set_options(&by_line);
        assert!(tally.results().is_none());
        assert!(!tally.can_undo());
        tally.run(&posts, &CancellationToken::new()).unwrap();
        assert_eq!(flat_counts(&tally, VoteType::Vote).len(), 3);

        tally.set_options(&QuestOptions::DEFAULT);
        tally.run(&posts, &CancellationToken::new()).unwrap();
        assert_eq!(
            tally.ledger().resolve("Head north", PartitionMode::ByBlock),
            Some("Go north".to_string())
        );
        assert_eq!(
            flat_counts(&tally, VoteType::Vote),
            vec![("Go north".to_string(), 2), ("Go south".to_string(), 1)]
        );
    }

    #[test]
    fn comparison_change_resets_everything() {
        let posts = vec![post("A", 1, "[x] One"), post("B", 2, "[x] Two")];
        let mut tally = run(&QuestOptions::DEFAULT, &posts);
        tally.merge_votes(VoteType::Vote, "One", "Two").unwrap();
        tally.set_options(&QuestOptions {
            comparison: ComparisonConfig {
                case_sensitive: true,
                symbols_significant: false,
            },
            ..QuestOptions::DEFAULT
        });
        assert!(tally.results().is_none());
        assert!(tally.ledger().is_empty());
        assert!(tally.options().comparison.case_sensitive);
    }
}
