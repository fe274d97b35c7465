// ********* Input data structures ***********

use snafu::Snafu;

use crate::agnostic::ComparisonConfig;

/// How the lines of one vote are split into independently counted units.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum PartitionMode {
    /// The whole vote is a single unit.
    None,
    /// Every line is its own unit.
    ByLine,
    /// Every top-level line and its indented children form a unit. Plans stay whole.
    ByBlock,
    /// Like `ByBlock`, but the content of plans is split into blocks as well.
    ByBlockAll,
}

/// The algorithm used to order the options of a ranked task.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RankVoteCounterMethod {
    Wilson,
    Baldwin,
    Rirv,
    Schulze,
}

/// The kind of a counted unit, derived from the marker of its first line.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum VoteType {
    Vote,
    Plan,
    Rank,
    Approval,
}

impl VoteType {
    pub const ALL: [VoteType; 4] = [
        VoteType::Vote,
        VoteType::Plan,
        VoteType::Rank,
        VoteType::Approval,
    ];
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestOptions {
    pub partition_mode: PartitionMode,
    pub comparison: ComparisonConfig,
    pub rank_counter: RankVoteCounterMethod,
    /// Cut long explanations after a colon or a dash from the content of vote lines.
    pub trim_extended_text: bool,
    /// If set, a block named after another voter is never a plan, even if it
    /// looks like one. Self-naming stays allowed.
    pub forbid_plan_voter_names: bool,
}

impl QuestOptions {
    pub const DEFAULT: QuestOptions = QuestOptions {
        partition_mode: PartitionMode::ByBlock,
        comparison: ComparisonConfig::DEFAULT,
        rank_counter: RankVoteCounterMethod::Baldwin,
        trim_extended_text: false,
        forbid_plan_voter_names: true,
    };
}

impl Default for QuestOptions {
    fn default() -> Self {
        QuestOptions::DEFAULT
    }
}

// ******** Output data structures *********

/// One position in the ordered outcome of a ranked task.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedResult {
    /// Position, starting at 1.
    pub rank: u32,
    /// Algorithm-specific strength of the option at the time it was placed.
    pub score: f64,
    pub vote: String,
}

/// Errors raised by the tally session and the correction operations.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("post {post_id} has no author"))]
    EmptyAuthor { post_id: u64 },
    #[snafu(display("post by {author} has no post id"))]
    MissingPostId { author: String },
    #[snafu(display("cannot merge {vote:?} into itself"))]
    SelfMerge { vote: String },
    #[snafu(display("merging {original:?} into {revised:?} would create a cycle"))]
    MergeCycle { original: String, revised: String },
    #[snafu(display("no {vote_type:?} vote matches {vote:?}"))]
    VoteNotFound { vote: String, vote_type: VoteType },
    #[snafu(display("unknown voter {voter}"))]
    VoterNotFound { voter: String },
    #[snafu(display("vote {vote:?} has no children to partition"))]
    NothingToPartition { vote: String },
    #[snafu(display("no tally has been run yet"))]
    NoResults {},
    #[snafu(display("the tally was cancelled"))]
    Cancelled {},
}
