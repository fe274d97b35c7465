use crate::agnostic::AgnosticComparer;
use crate::ranking::RankedVotes;
use crate::vote_line::{Marker, VoteLine};

const MAX_RANK: u32 = 9;

/// A builder for the input of the ranked-vote counters.
///
/// Options that are agnostically equal are stored under the first spelling
/// seen. A voter who ranks the same option twice keeps the better rank.
///
/// ```
/// use quest_tally::builder::Builder;
/// use quest_tally::ranking::RankedCounter;
/// use quest_tally::{AgnosticComparer, RankVoteCounterMethod};
///
/// let mut builder = Builder::new(AgnosticComparer::DEFAULT);
/// builder.add_rank("Apple", "voter1", 1);
/// builder.add_rank("banana", "voter1", 2);
/// builder.add_rank("Banana!", "voter2", 1);
///
/// let votes = builder.build();
/// assert_eq!(votes.len(), 2);
/// let results = RankVoteCounterMethod::Schulze.counter().count(&votes);
/// assert_eq!(results.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    comparer: AgnosticComparer,
    votes: RankedVotes,
}

impl Builder {
    pub fn new(comparer: AgnosticComparer) -> Builder {
        Builder {
            comparer,
            votes: RankedVotes::new(),
        }
    }

    /// Adds one ranking. Ranks are clamped between 1 and 9.
    pub fn add_rank(&mut self, option: &str, voter: &str, rank: u32) {
        let rank = rank.clamp(1, MAX_RANK);
        let key = self
            .votes
            .keys()
            .find(|k| self.comparer.equals(k, option))
            .cloned()
            .unwrap_or_else(|| option.to_string());
        let ranks = self.votes.entry(key).or_default();
        let best = ranks.get(voter).map(|r| (*r).min(rank)).unwrap_or(rank);
        ranks.insert(voter.to_string(), best);
    }

    /// Adds a score from 1 to 9. A higher score is a better rank.
    pub fn add_score(&mut self, option: &str, voter: &str, score: u32) {
        let rank = 10u32.saturating_sub(score.clamp(1, MAX_RANK));
        self.add_rank(option, voter, rank)
    }

    /// Adds a vote line under its marker. Lines that are neither ranked nor
    /// scored are ignored.
    pub fn add_line(&mut self, line: &VoteLine, voter: &str) {
        self.add_marked(&line.vote_text(), voter, line.marker())
    }

    pub fn add_marked(&mut self, option: &str, voter: &str, marker: Marker) {
        match marker {
            Marker::Rank(r) => self.add_rank(option, voter, r as u32),
            Marker::Score(s) => self.add_score(option, voter, s as u32),
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn build(self) -> RankedVotes {
        self.votes
    }
}
