/*!
Tallies of the votes cast in forum quests.

Votes are written as bracketed lines inside posts (`[x] Go north`,
`[#1] Apple`, `-[x] sub-item`). A [tally::Tally] reads the posts of a thread,
groups equivalent votes, resolves plans and references to other voters, and
counts ranked tasks with one of the [RankVoteCounterMethod] algorithms.

See the [manual] for the vote syntax.
*/

mod config;

pub mod agnostic;
pub mod builder;
pub mod content;
pub mod ledger;
pub mod manual;
pub mod partition;
pub mod post;
pub mod ranking;
pub mod scoring;
pub mod storage;
pub mod tally;
pub mod vote_line;
pub mod vote_node;

pub use crate::agnostic::{AgnosticComparer, ComparisonConfig};
pub use crate::config::*;
pub use crate::post::Post;
pub use crate::tally::{CancellationToken, Tally, TallyResults};
pub use crate::vote_line::VoteLine;
