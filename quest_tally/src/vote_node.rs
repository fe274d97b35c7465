//! Grouping of the votes of one task into trees for display.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use crate::partition::{is_plan_voter, plan_name, PlanRegistry, VotePartition};
use crate::vote_line::{LineKey, VoteLine};

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteNode {
    pub text: String,
    pub children: Vec<VoteNode>,
    /// Voters who support this line and nothing below it.
    pub voters: BTreeSet<String>,
    /// Voters of this node and of all its descendants.
    pub all_voters: BTreeSet<String>,
    /// The node stands for a reference to a known plan.
    pub plan_reference: bool,
    key: LineKey,
}

impl VoteNode {
    fn new(line: &VoteLine) -> VoteNode {
        let line = line.with_depth(0);
        VoteNode {
            text: line.vote_text(),
            children: Vec::new(),
            voters: BTreeSet::new(),
            all_voters: BTreeSet::new(),
            plan_reference: false,
            key: line.key(),
        }
    }

    // A child holding several lines at once, compared by its whole text.
    fn opaque(lines: &[VoteLine]) -> VoteNode {
        let first = &lines[0];
        let base = first.depth();
        let text = lines
            .iter()
            .map(|l| l.with_depth(l.depth().saturating_sub(base)).vote_text())
            .collect::<Vec<String>>()
            .join("\n");
        let content = lines
            .iter()
            .map(|l| format!("{}:{}", l.depth().saturating_sub(base), l.simplified_content()))
            .collect::<Vec<String>>()
            .join("\n");
        VoteNode {
            text,
            children: Vec::new(),
            voters: BTreeSet::new(),
            all_voters: BTreeSet::new(),
            plan_reference: false,
            key: LineKey {
                depth: 0,
                task: first.key().task,
                content,
            },
        }
    }

    fn add_voters(&mut self, voters: &BTreeSet<String>) {
        self.voters.extend(voters.iter().cloned());
        self.all_voters.extend(voters.iter().cloned());
    }

    // Children that are agnostically equal share one node.
    fn add_child(&mut self, child: VoteNode) {
        self.all_voters.extend(child.all_voters.iter().cloned());
        match self.children.iter_mut().find(|c| c.key == child.key) {
            Some(existing) => {
                existing.add_voters(&child.voters);
                for grandchild in child.children {
                    existing.add_child(grandchild);
                }
            }
            None => self.children.push(child),
        }
    }

    /// Number of supporters, plans left out.
    pub fn voter_count(&self) -> usize {
        self.all_voters.iter().filter(|v| !is_plan_voter(v)).count()
    }

    fn sort(&mut self, post_ids: &HashMap<String, u64>) {
        for child in self.children.iter_mut() {
            child.sort(post_ids);
        }
        sort_nodes(&mut self.children, post_ids);
    }
}

fn sort_nodes(nodes: &mut [VoteNode], post_ids: &HashMap<String, u64>) {
    let latest = |node: &VoteNode| {
        node.all_voters
            .iter()
            .filter_map(|v| post_ids.get(v))
            .max()
            .cloned()
            .unwrap_or(0)
    };
    nodes.sort_by_key(|n| (Reverse(n.voter_count()), latest(n)));
}

/// Builds the node forest of one task.
///
/// `votes` holds each partition with its supporters, `post_ids` maps every
/// voter to the post of their counted vote.
pub fn build_nodes(
    votes: &[(VotePartition, BTreeSet<String>)],
    plans: &PlanRegistry,
    post_ids: &HashMap<String, u64>,
) -> Vec<VoteNode> {
    let mut groups: Vec<(LineKey, Vec<&(VotePartition, BTreeSet<String>)>)> = Vec::new();
    for vote in votes {
        let key = vote.0.first_line().with_depth(0).key();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(vote),
            None => groups.push((key, vec![vote])),
        }
    }

    let mut nodes: Vec<VoteNode> = Vec::new();
    for (_, members) in groups {
        let first = members[0].0.first_line();
        let mut node = VoteNode::new(first);
        let names_plan = plan_name(first)
            .map(|(name, _)| plans.contains(&name))
            .unwrap_or(false);
        if members.len() == 1 && names_plan {
            node.plan_reference = true;
            node.add_voters(&members[0].1);
            nodes.push(node);
            continue;
        }
        for (partition, voters) in members {
            let rest = &partition.lines()[1..];
            if rest.is_empty() {
                node.add_voters(voters);
            } else if rest.iter().all(|l| l.depth() == 1) {
                for line in rest {
                    let mut child = VoteNode::new(line);
                    child.add_voters(voters);
                    node.add_child(child);
                }
            } else if rest.len() == 1 && rest[0].depth() > 0 {
                let mut child = VoteNode::new(&rest[0]);
                child.add_voters(voters);
                node.add_child(child);
            } else {
                let mut child = VoteNode::opaque(rest);
                child.add_voters(voters);
                node.add_child(child);
            }
        }
        nodes.push(node);
    }

    for node in nodes.iter_mut() {
        node.sort(post_ids);
    }
    sort_nodes(&mut nodes, post_ids);
    nodes
}
