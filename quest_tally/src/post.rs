use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use snafu::ensure;

use crate::config::*;
use crate::vote_line::{Marker, ParseOptions, VoteLine, VoteLineError};

static QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\[quote(=[^\]]*)?\].*?\[/quote\]").unwrap());
// A bare mention is a single token; a linked mention is delimited by its tags.
static NOMINATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:@(?P<name>[^\s@\[\]]+)|\[url=[^\]]*\]@(?P<linked>[^@\[\]]+)\[/url\])$")
        .unwrap()
});

/// A forum post, as handed over by the thread reader.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Post {
    pub author: String,
    pub post_id: u64,
    /// Position of the post in the thread.
    pub number: u32,
    pub text: String,
}

impl Post {
    pub fn new(author: &str, post_id: u64, number: u32, text: &str) -> Result<Post, TallyError> {
        ensure!(!author.trim().is_empty(), EmptyAuthorSnafu { post_id });
        ensure!(post_id > 0, MissingPostIdSnafu { author });
        Ok(Post {
            author: author.trim().to_string(),
            post_id,
            number,
            text: text.to_string(),
        })
    }

    /// Posts that carry the output of a previous tally.
    pub fn is_tally_post(&self) -> bool {
        self.text
            .lines()
            .any(|l| l.trim_start().starts_with("#####"))
    }
}

/// A line of a post that looked like a vote line but could not be read.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LineFailure {
    /// 1-based
    pub line_number: usize,
    pub error: VoteLineError,
}

/// The vote lines found in one post.
#[derive(Debug, Clone)]
pub struct PostVote {
    pub author: String,
    pub post_id: u64,
    pub number: u32,
    pub lines: Vec<VoteLine>,
    pub failures: Vec<LineFailure>,
}

impl PostVote {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Extracts the vote lines of a post.
///
/// Quoted sections are skipped. Continuation lines are folded into the line
/// above them. A post without any vote line may still be a list of
/// nominations.
pub fn parse_post(post: &Post, options: &ParseOptions) -> PostVote {
    let text = QUOTE_RE.replace_all(&post.text, "");
    let mut lines: Vec<VoteLine> = Vec::new();
    let mut failures: Vec<LineFailure> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        match VoteLine::parse(raw, options) {
            Ok(vl) if vl.marker() == Marker::Continuation => match lines.last_mut() {
                Some(prev) => {
                    let joined = format!("{} {}", prev.content(), vl.content());
                    *prev = prev.with_content(&joined);
                }
                None => failures.push(LineFailure {
                    line_number: idx + 1,
                    error: VoteLineError::OrphanContinuation {
                        line: raw.to_string(),
                    },
                }),
            },
            Ok(vl) => lines.push(vl),
            Err(VoteLineError::NotAVoteLine {}) => {}
            Err(error) => {
                debug!(
                    "parse_post: post {} by {}: line {}: {}",
                    post.post_id,
                    post.author,
                    idx + 1,
                    error
                );
                failures.push(LineFailure {
                    line_number: idx + 1,
                    error,
                });
            }
        }
    }

    if lines.is_empty() {
        lines = nominations(&text, options);
    }

    PostVote {
        author: post.author.clone(),
        post_id: post.post_id,
        number: post.number,
        lines,
        failures,
    }
}

// All or nothing: one line that is not a nomination voids the whole post.
fn nominations(text: &str, options: &ParseOptions) -> Vec<VoteLine> {
    let mut res: Vec<VoteLine> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let name = NOMINATION_RE
            .captures(line)
            .and_then(|caps| caps.name("name").or_else(|| caps.name("linked")));
        match name {
            Some(m) => res.push(VoteLine::from_parts(
                0,
                Marker::Vote,
                "",
                m.as_str().trim(),
                options,
            )),
            None => return Vec::new(),
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str) -> Post {
        Post::new("Alice", 100, 1, text).unwrap()
    }

    #[test]
    fn rejects_invalid_posts() {
        assert_eq!(
            Post::new("  ", 4, 1, "x"),
            Err(TallyError::EmptyAuthor { post_id: 4 })
        );
        assert!(matches!(
            Post::new("Bob", 0, 1, "x"),
            Err(TallyError::MissingPostId { .. })
        ));
    }

    #[test]
    fn keeps_good_lines_next_to_bad_ones() {
        let p = post("Some chatter\n[x] Go north\n[q] broken\n-[x] Carefully\n[x unbalanced");
        let pv = parse_post(&p, &ParseOptions::default());
        assert_eq!(pv.lines.len(), 2);
        assert_eq!(pv.failures.len(), 2);
        assert_eq!(pv.failures[0].line_number, 3);
        assert!(matches!(
            pv.failures[1].error,
            VoteLineError::UnbalancedBrackets { .. }
        ));
    }

    #[test]
    fn continuation_lines_extend_the_previous_line() {
        let p = post("[x] Go north\n[*] and then east\n[*] orphan? no");
        let pv = parse_post(&p, &ParseOptions::default());
        assert_eq!(pv.lines.len(), 1);
        assert_eq!(pv.lines[0].content(), "Go north and then east orphan? no");

        let p = post("[*] nothing before");
        let pv = parse_post(&p, &ParseOptions::default());
        assert!(pv.is_empty());
        assert!(matches!(
            pv.failures[0].error,
            VoteLineError::OrphanContinuation { .. }
        ));
    }

    #[test]
    fn quoted_votes_are_ignored() {
        let p = post("[quote=Bob][x] Bob's vote[/quote]\n[x] My vote");
        let pv = parse_post(&p, &ParseOptions::default());
        assert_eq!(pv.lines.len(), 1);
        assert_eq!(pv.lines[0].content(), "My vote");
    }

    #[test]
    fn nominations_are_all_or_nothing() {
        let p = post("@Kirito\n\n[url=https://forum/members/12/]@Asuna[/url]");
        let pv = parse_post(&p, &ParseOptions::default());
        let names: Vec<&str> = pv.lines.iter().map(|l| l.content()).collect();
        assert_eq!(names, vec!["Kirito", "Asuna"]);
        assert!(pv.lines.iter().all(|l| l.marker() == Marker::Vote));

        let p = post("@Kirito\nand also this guy");
        assert!(parse_post(&p, &ParseOptions::default()).is_empty());
    }

    #[test]
    fn replies_to_a_member_are_not_nominations() {
        let p = post("@Bob thanks for the update, looking forward to more");
        assert!(parse_post(&p, &ParseOptions::default()).is_empty());

        let p = post("[url=https://forum/members/7/]@Bob[/url] agreed");
        assert!(parse_post(&p, &ParseOptions::default()).is_empty());

        let p = post("[url=https://forum/members/7/]@Mister Bob[/url]");
        let pv = parse_post(&p, &ParseOptions::default());
        assert_eq!(pv.lines.len(), 1);
        assert_eq!(pv.lines[0].content(), "Mister Bob");
    }

    #[test]
    fn detects_tally_posts() {
        assert!(post("##### Tally results\n[x] a").is_tally_post());
        assert!(!post("[x] a").is_tally_post());
    }
}
