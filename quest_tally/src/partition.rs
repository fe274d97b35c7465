//! Plans, references and the partitioning of votes into counted units.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::agnostic::AgnosticComparer;
use crate::config::*;
use crate::post::PostVote;
use crate::vote_line::{LineKey, MarkerType, VoteLine};

/// Prefix of the pseudo-voter that stands for a plan in voter sets.
pub const PLAN_MARKER: char = '◈';

static PLAN_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<base>base\s*)?plan\b\s*:?\s*(?P<name>.+)$").unwrap());

#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct PartitionKey(pub Vec<LineKey>);

/// An ordered, non-empty run of vote lines counted as one unit.
#[derive(Debug, Clone)]
pub struct VotePartition {
    lines: Vec<VoteLine>,
}

impl VotePartition {
    pub fn new(lines: Vec<VoteLine>) -> VotePartition {
        assert!(!lines.is_empty(), "a partition needs at least one line");
        VotePartition { lines }
    }

    pub fn lines(&self) -> &[VoteLine] {
        &self.lines
    }

    pub fn first_line(&self) -> &VoteLine {
        &self.lines[0]
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn task(&self) -> &str {
        self.first_line().task()
    }

    pub fn key(&self) -> PartitionKey {
        PartitionKey(self.lines.iter().map(|l| l.key()).collect())
    }

    /// The partition as it is shown in results, one line per line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.vote_text())
            .collect::<Vec<String>>()
            .join("\n")
    }
}

impl PartialEq for VotePartition {
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl Eq for VotePartition {}

impl Hash for VotePartition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lines.hash(state)
    }
}

impl Display for VotePartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// How a plan was written. Later variants take precedence over earlier ones.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum PlanType {
    /// A lone `Plan X` line.
    SingleLine,
    /// A `Plan X` line on top of an unindented vote: the whole post is the plan.
    Label,
    /// A `Plan X` line with indented content.
    Content,
    /// A `Base Plan X` line with indented content.
    Base,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub name: String,
    pub author: String,
    pub post_id: u64,
    pub plan_type: PlanType,
    /// 1 for the first variant of a name, 2 for the next one, etc.
    pub variant: u32,
    pub content: VotePartition,
}

impl Plan {
    pub fn display_name(&self) -> String {
        if self.variant <= 1 {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.variant)
        }
    }

    /// The name under which the plan itself supports its content.
    pub fn voter_name(&self) -> String {
        format!("{}{}", PLAN_MARKER, self.display_name())
    }
}

pub fn is_plan_voter(voter: &str) -> bool {
    voter.starts_with(PLAN_MARKER)
}

/// The plan named by a line, and whether it is a base plan.
pub fn plan_name(line: &VoteLine) -> Option<(String, bool)> {
    let caps = PLAN_NAME_RE.captures(line.comparable_content())?;
    let name = caps["name"].trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some((name, caps.name("base").is_some()))
}

/// The plans of a quest. Lookups are agnostic.
#[derive(Debug, Clone, Default)]
pub struct PlanRegistry {
    comparer: AgnosticComparer,
    plans: Vec<Plan>,
}

impl PlanRegistry {
    pub fn new(comparer: AgnosticComparer) -> PlanRegistry {
        PlanRegistry {
            comparer,
            plans: Vec::new(),
        }
    }

    /// Stores a plan, following the precedence of plan types.
    ///
    /// A strictly higher type replaces every stored variant, an equal type is
    /// kept next to the others if its content differs, a lower one is dropped.
    pub fn add(&mut self, mut plan: Plan) -> bool {
        let existing: Vec<usize> = self
            .plans
            .iter()
            .enumerate()
            .filter(|(_, p)| self.comparer.equals(&p.name, &plan.name))
            .map(|(idx, _)| idx)
            .collect();
        let best = existing.iter().map(|idx| self.plans[*idx].plan_type).max();
        match best {
            None => {
                plan.variant = 1;
            }
            Some(best) if plan.plan_type > best => {
                debug!(
                    "PlanRegistry::add: {:?} {:?} replaces {} variant(s)",
                    plan.plan_type,
                    plan.name,
                    existing.len()
                );
                let name = plan.name.clone();
                let cmp = self.comparer;
                self.plans.retain(|p| !cmp.equals(&p.name, &name));
                plan.variant = 1;
            }
            Some(best) if plan.plan_type == best => {
                let key = plan.content.key();
                if existing
                    .iter()
                    .any(|idx| self.plans[*idx].content.key() == key)
                {
                    return false;
                }
                plan.variant = existing.len() as u32 + 1;
            }
            Some(_) => {
                return false;
            }
        }
        self.plans.push(plan);
        true
    }

    /// The first variant of the named plan.
    pub fn get(&self, name: &str) -> Option<&Plan> {
        self.plans
            .iter()
            .find(|p| self.comparer.equals(&p.display_name(), name))
            .or_else(|| {
                self.plans
                    .iter()
                    .find(|p| p.variant <= 1 && self.comparer.equals(&p.name, name))
            })
    }

    pub fn variants(&self, name: &str) -> Vec<&Plan> {
        self.plans
            .iter()
            .filter(|p| self.comparer.equals(&p.name, name))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Splits lines into blocks: a top-level line and the indented lines below it.
pub fn split_blocks(lines: &[VoteLine]) -> Vec<Vec<VoteLine>> {
    let mut blocks: Vec<Vec<VoteLine>> = Vec::new();
    for line in lines {
        if line.depth() > 0 {
            if let Some(block) = blocks.last_mut() {
                block.push(line.clone());
                continue;
            }
        }
        blocks.push(vec![line.clone()]);
    }
    blocks
}

/// The known voters of a quest, folded for agnostic lookups.
#[derive(Debug, Clone, Default)]
pub struct VoterNames {
    comparer: AgnosticComparer,
    names: HashMap<String, String>,
}

impl VoterNames {
    pub fn new(comparer: AgnosticComparer) -> VoterNames {
        VoterNames {
            comparer,
            names: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str) {
        self.names
            .entry(self.comparer.fold(name))
            .or_insert_with(|| name.to_string());
    }

    /// The voter name as it was first seen.
    pub fn get(&self, name: &str) -> Option<&String> {
        self.names.get(&self.comparer.fold(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Everything partitioning needs to know about the quest.
pub struct PartitionContext<'a> {
    pub comparer: AgnosticComparer,
    pub mode: PartitionMode,
    pub plans: &'a PlanRegistry,
    pub voters: &'a VoterNames,
    pub forbid_plan_voter_names: bool,
}

impl<'a> PartitionContext<'a> {
    /// A block written by `author` may only name a plan after another voter
    /// if that is allowed.
    pub fn is_valid_plan_name(&self, name: &str, author: &str) -> bool {
        !self.forbid_plan_voter_names
            || !self.voters.contains(name)
            || self.comparer.equals(name, author)
    }

    /// The plans defined by a post.
    pub fn plans_in_post(&self, vote: &PostVote) -> Vec<Plan> {
        let mut res: Vec<Plan> = Vec::new();
        let blocks = split_blocks(&vote.lines);
        let make_plan = |name: String, plan_type: PlanType, lines: Vec<VoteLine>| Plan {
            name,
            author: vote.author.clone(),
            post_id: vote.post_id,
            plan_type,
            variant: 1,
            content: VotePartition::new(lines),
        };

        if let Some((name, is_base)) = vote.lines.first().and_then(plan_name) {
            let all_flat = vote.lines.iter().all(|l| l.depth() == 0);
            if all_flat && vote.lines.len() > 1 && !is_base {
                if self.is_valid_plan_name(&name, &vote.author) {
                    res.push(make_plan(name, PlanType::Label, label_lines(&vote.lines)));
                }
                return res;
            }
        }

        for block in blocks {
            let (name, is_base) = match plan_name(&block[0]) {
                Some(p) => p,
                None => continue,
            };
            if !self.is_valid_plan_name(&name, &vote.author) {
                debug!(
                    "plans_in_post: {:?} by {} is named after another voter",
                    name, vote.author
                );
                continue;
            }
            let plan_type = match (block.len() > 1, is_base) {
                (true, true) => PlanType::Base,
                (true, false) => PlanType::Content,
                (false, _) => PlanType::SingleLine,
            };
            res.push(make_plan(name, plan_type, block));
        }
        res
    }

    /// Replaces single-line references to plans and to other voters with the
    /// content they refer to. `prior_votes` holds the latest vote of each voter
    /// seen so far, keyed by folded voter name.
    pub fn expand_references(
        &self,
        lines: &[VoteLine],
        author: &str,
        prior_votes: &HashMap<String, Vec<VoteLine>>,
    ) -> Vec<VoteLine> {
        let mut res: Vec<VoteLine> = Vec::new();
        for block in split_blocks(lines) {
            if block.len() > 1 {
                res.extend(block);
                continue;
            }
            let line = &block[0];
            let named = plan_name(line).map(|(name, _)| name);
            let plan = named
                .as_deref()
                .and_then(|n| self.plans.get(n))
                .or_else(|| self.plans.get(line.comparable_content()));
            if let Some(plan) = plan {
                if plan.content.line_count() > 1 {
                    debug!(
                        "expand_references: {} refers to plan {:?}",
                        author,
                        plan.display_name()
                    );
                    let mut content = plan.content.lines().to_vec();
                    content[0] = content[0].with_marker(line.marker());
                    res.extend(content);
                } else {
                    res.push(line.clone());
                }
                continue;
            }
            let proxy = [named.as_deref(), Some(line.comparable_content())]
                .into_iter()
                .flatten()
                .filter(|n| !self.comparer.equals(n, author))
                .find_map(|n| prior_votes.get(&self.comparer.fold(n)));
            match proxy {
                Some(proxied)
                    if !matches!(line.marker_type(), MarkerType::Rank | MarkerType::Score) =>
                {
                    debug!(
                        "expand_references: {} proxies {:?}",
                        author,
                        line.comparable_content()
                    );
                    res.extend(proxied.iter().cloned());
                }
                _ => res.push(line.clone()),
            }
        }
        res
    }

    /// Splits a final vote into counted units according to the partition mode.
    pub fn partition(&self, lines: &[VoteLine]) -> Vec<(VoteType, VotePartition)> {
        let mut res: Vec<(VoteType, VotePartition)> = Vec::new();
        let mut unsplit: Vec<VoteLine> = Vec::new();
        for block in split_blocks(lines) {
            let first = &block[0];
            if matches!(first.marker_type(), MarkerType::Rank | MarkerType::Score) {
                // Ranked lines are always counted one by one.
                for line in block.iter() {
                    let single = promote(line, first.task(), 0);
                    res.push((VoteType::Rank, VotePartition::new(vec![single])));
                }
                continue;
            }
            let is_plan = self.names_plan(first);
            match self.mode {
                PartitionMode::None => unsplit.extend(block),
                PartitionMode::ByLine => {
                    let skip = usize::from(is_plan && block.len() > 1);
                    for line in block.iter().skip(skip) {
                        let single = promote(line, first.task(), 0);
                        res.push(self.typed(VotePartition::new(vec![single])));
                    }
                }
                PartitionMode::ByBlock => res.push(self.typed(VotePartition::new(block))),
                PartitionMode::ByBlockAll if is_plan && block.len() > 1 => {
                    let children: Vec<VoteLine> = block[1..]
                        .iter()
                        .map(|l| promote(l, first.task(), l.depth().saturating_sub(1)))
                        .collect();
                    for sub in split_blocks(&children) {
                        res.push(self.typed(VotePartition::new(sub)));
                    }
                }
                PartitionMode::ByBlockAll => res.push(self.typed(VotePartition::new(block))),
            }
        }
        if !unsplit.is_empty() {
            res.push(self.typed(VotePartition::new(unsplit)));
        }
        res
    }

    fn names_plan(&self, line: &VoteLine) -> bool {
        plan_name(line)
            .map(|(name, _)| self.plans.contains(&name))
            .unwrap_or(false)
    }

    fn typed(&self, partition: VotePartition) -> (VoteType, VotePartition) {
        let first = partition.first_line();
        let vote_type = match first.marker_type() {
            MarkerType::Approval => VoteType::Approval,
            MarkerType::Rank | MarkerType::Score => VoteType::Rank,
            _ if self.names_plan(first) => VoteType::Plan,
            _ => VoteType::Vote,
        };
        (vote_type, partition)
    }
}

/// The lines of a label plan, with everything below the name line indented.
pub fn label_lines(lines: &[VoteLine]) -> Vec<VoteLine> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, l)| if idx == 0 { l.clone() } else { l.with_depth(1) })
        .collect()
}

// Moves a line to a new depth, giving it the task of its block if it has none.
pub(crate) fn promote(line: &VoteLine, block_task: &str, depth: usize) -> VoteLine {
    let moved = line.with_depth(depth);
    if moved.task().is_empty() && !block_task.is_empty() {
        moved.with_task(block_task)
    } else {
        moved
    }
}

/// Distinct tasks of a set of partitions, in order of first appearance.
pub fn tasks_of<'a, I>(partitions: I, comparer: &AgnosticComparer) -> Vec<String>
where
    I: IntoIterator<Item = &'a VotePartition>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for p in partitions {
        if seen.insert(comparer.fold(p.task())) {
            res.push(p.task().to_string());
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{parse_post, Post};
    use crate::vote_line::ParseOptions;

    fn vote(author: &str, post_id: u64, text: &str) -> PostVote {
        let post = Post::new(author, post_id, post_id as u32, text).unwrap();
        parse_post(&post, &ParseOptions::default())
    }

    fn lines(text: &str) -> Vec<VoteLine> {
        vote("Someone", 1, text).lines
    }

    fn context<'a>(
        mode: PartitionMode,
        plans: &'a PlanRegistry,
        voters: &'a VoterNames,
    ) -> PartitionContext<'a> {
        PartitionContext {
            comparer: AgnosticComparer::DEFAULT,
            mode,
            plans,
            voters,
            forbid_plan_voter_names: true,
        }
    }

    fn texts(parts: &[(VoteType, VotePartition)]) -> Vec<String> {
        parts.iter().map(|(_, p)| p.text()).collect()
    }

    #[test]
    fn finds_plan_names() {
        let l = lines("[x] Plan: Dragon Slayer\n[x] base plan Castle\n[x] Planet Earth");
        assert_eq!(plan_name(&l[0]), Some(("Dragon Slayer".to_string(), false)));
        assert_eq!(plan_name(&l[1]), Some(("Castle".to_string(), true)));
        assert_eq!(plan_name(&l[2]), None);
    }

    #[test]
    fn detects_plan_types() {
        let plans = PlanRegistry::new(AgnosticComparer::DEFAULT);
        let voters = VoterNames::new(AgnosticComparer::DEFAULT);
        let ctx = context(PartitionMode::ByBlock, &plans, &voters);

        let found = ctx.plans_in_post(&vote("A", 1, "[x] Plan Alpha\n-[x] one\n-[x] two"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plan_type, PlanType::Content);

        let found = ctx.plans_in_post(&vote("A", 1, "[x] Base Plan Alpha\n-[x] one"));
        assert_eq!(found[0].plan_type, PlanType::Base);

        let found = ctx.plans_in_post(&vote("A", 1, "[x] Plan Alpha\n[x] one\n[x] two"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plan_type, PlanType::Label);
        assert_eq!(found[0].content.lines()[1].depth(), 1);

        let found = ctx.plans_in_post(&vote("A", 1, "[x] Plan Alpha"));
        assert_eq!(found[0].plan_type, PlanType::SingleLine);
    }

    #[test]
    fn plans_cannot_impersonate_other_voters() {
        let plans = PlanRegistry::new(AgnosticComparer::DEFAULT);
        let mut voters = VoterNames::new(AgnosticComparer::DEFAULT);
        voters.insert("Bob");
        voters.insert("Alice");
        let ctx = context(PartitionMode::ByBlock, &plans, &voters);

        let found = ctx.plans_in_post(&vote("Alice", 1, "[x] Plan Bob\n-[x] one"));
        assert!(found.is_empty());
        let found = ctx.plans_in_post(&vote("Bob", 1, "[x] Plan bob\n-[x] one"));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn registry_precedence() {
        let plans_ctx = PlanRegistry::new(AgnosticComparer::DEFAULT);
        let voters = VoterNames::new(AgnosticComparer::DEFAULT);
        let ctx = context(PartitionMode::ByBlock, &plans_ctx, &voters);
        let single = ctx.plans_in_post(&vote("A", 1, "[x] Plan Alpha")).remove(0);
        let content1 = ctx
            .plans_in_post(&vote("B", 2, "[x] Plan Alpha\n-[x] one"))
            .remove(0);
        let content1_again = ctx
            .plans_in_post(&vote("C", 3, "[x] plan alpha\n-[x] ONE"))
            .remove(0);
        let content2 = ctx
            .plans_in_post(&vote("D", 4, "[x] Plan Alpha\n-[x] two"))
            .remove(0);
        let base = ctx
            .plans_in_post(&vote("E", 5, "[x] Base Plan Alpha\n-[x] three"))
            .remove(0);

        let mut registry = PlanRegistry::new(AgnosticComparer::DEFAULT);
        assert!(registry.add(single.clone()));
        assert!(registry.add(content1));
        assert_eq!(registry.variants("alpha").len(), 1);
        assert_eq!(registry.get("Alpha").unwrap().plan_type, PlanType::Content);
        assert!(!registry.add(single));
        assert!(!registry.add(content1_again));
        assert!(registry.add(content2));
        let variants = registry.variants("Alpha");
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1].display_name(), "Alpha (2)");
        assert_eq!(registry.get("Alpha (2)").unwrap().author, "D");
        assert!(registry.add(base));
        assert_eq!(registry.variants("Alpha").len(), 1);
        assert_eq!(registry.get("alpha").unwrap().plan_type, PlanType::Base);
    }

    #[test]
    fn expands_plan_and_proxy_references() {
        let mut plans = PlanRegistry::new(AgnosticComparer::DEFAULT);
        let mut voters = VoterNames::new(AgnosticComparer::DEFAULT);
        voters.insert("Bob");
        voters.insert("Carol");
        {
            let ctx = context(PartitionMode::ByBlock, &plans, &voters);
            for p in ctx.plans_in_post(&vote("Bob", 1, "[x] Plan Alpha\n-[x] one\n-[x] two")) {
                plans.add(p);
            }
        }
        let ctx = context(PartitionMode::ByBlock, &plans, &voters);
        let mut prior: HashMap<String, Vec<VoteLine>> = HashMap::new();
        prior.insert("bob".to_string(), lines("[x] Go east"));

        let expanded = ctx.expand_references(&lines("[x] plan alpha\n[x] Other"), "Carol", &prior);
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[1].content(), "one");

        let expanded = ctx.expand_references(&lines("[x] Bob"), "Carol", &prior);
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].content(), "Go east");

        let expanded = ctx.expand_references(&lines("[x] Bob"), "bob", &prior);
        assert_eq!(expanded[0].content(), "Bob");

        let expanded = ctx.expand_references(&lines("[1] Bob"), "Carol", &prior);
        assert_eq!(expanded[0].content(), "Bob");
    }

    #[test]
    fn partitions_by_mode() {
        let mut plans = PlanRegistry::new(AgnosticComparer::DEFAULT);
        let voters = VoterNames::new(AgnosticComparer::DEFAULT);
        let text = "[x][Go] North\n-[x] quickly\n[x] Plan Alpha\n-[x] one\n--[x] detail\n-[x] two\n[1] Apple";
        {
            let ctx = context(PartitionMode::ByBlock, &plans, &voters);
            for p in ctx.plans_in_post(&vote("Bob", 1, text)) {
                plans.add(p);
            }
        }
        let l = lines(text);

        let none = context(PartitionMode::None, &plans, &voters).partition(&l);
        assert_eq!(none.len(), 2);
        assert_eq!(none[0].0, VoteType::Rank);
        assert_eq!(none[1].1.line_count(), 6);

        let by_line = context(PartitionMode::ByLine, &plans, &voters).partition(&l);
        assert_eq!(
            texts(&by_line),
            vec!["[Go] North", "[Go] quickly", "one", "detail", "two", "Apple"]
        );

        let by_block = context(PartitionMode::ByBlock, &plans, &voters).partition(&l);
        assert_eq!(by_block.len(), 3);
        assert_eq!(by_block[0].0, VoteType::Vote);
        assert_eq!(by_block[1].0, VoteType::Plan);
        assert_eq!(by_block[1].1.line_count(), 4);

        let by_block_all = context(PartitionMode::ByBlockAll, &plans, &voters).partition(&l);
        assert_eq!(
            texts(&by_block_all),
            vec!["[Go] North\n-quickly", "one\n-detail", "two", "Apple"]
        );
    }

    #[test]
    fn approval_partitions() {
        let plans = PlanRegistry::new(AgnosticComparer::DEFAULT);
        let voters = VoterNames::new(AgnosticComparer::DEFAULT);
        let parts = context(PartitionMode::ByLine, &plans, &voters).partition(&lines("[+] Yes\n[-] No"));
        assert!(parts.iter().all(|(t, _)| *t == VoteType::Approval));
    }

    #[test]
    fn collects_tasks_in_order() {
        let l = lines("[x][B] one\n[x][a] two\n[x][b] three");
        let parts: Vec<VotePartition> = l.into_iter().map(|x| VotePartition::new(vec![x])).collect();
        assert_eq!(tasks_of(&parts, &AgnosticComparer::DEFAULT), vec!["B", "a"]);
    }
}
