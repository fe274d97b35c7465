//! A single line of a vote.
//!
//! Grammar: `prefix [marker] [task] content`, where the prefix is a run of
//! dashes and whitespace giving the indentation depth, the marker says how the
//! line is counted, and the task is an optional grouping label.

use std::fmt::Display;
use std::hash::{Hash, Hasher};

use snafu::{ensure, OptionExt, Snafu};

use crate::agnostic::AgnosticComparer;
use crate::content::{is_markup_tag, normalize_markup, strip_markup, trim_extended_text};

/// The kind of a marker, without its value.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MarkerType {
    Vote,
    Rank,
    Score,
    Approval,
    Continuation,
    None,
}

/// The bracketed token at the start of a vote line.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Marker {
    /// `[x]`, `[✓]`, `[✔]`
    Vote,
    /// `[1]` or `[#1]`, from 1 to 9.
    Rank(u8),
    /// `[+1]`, from 1 to 9.
    Score(u8),
    /// `[+]` (true) or `[-]` (false).
    Approval(bool),
    /// `[*]`: the line continues the previous one.
    Continuation,
    /// Lines that were not typed with a marker.
    None,
}

impl Marker {
    /// Recognizes a marker token, brackets and surrounding spaces removed.
    pub fn parse(token: &str) -> Option<Marker> {
        let token = token.trim_end_matches('\u{FE0F}');
        match token {
            t if t.eq_ignore_ascii_case("x") => Some(Marker::Vote),
            "✓" | "✔" => Some(Marker::Vote),
            "*" => Some(Marker::Continuation),
            "+" => Some(Marker::Approval(true)),
            "-" => Some(Marker::Approval(false)),
            _ => {
                // A bare digit and a '#' digit are both ranks.
                let (digits, score) = if let Some(d) = token.strip_prefix('#') {
                    (d, false)
                } else if let Some(d) = token.strip_prefix('+') {
                    (d, true)
                } else {
                    (token, false)
                };
                let value = single_digit(digits)?;
                if score {
                    Some(Marker::Score(value))
                } else {
                    Some(Marker::Rank(value))
                }
            }
        }
    }

    pub fn marker_type(&self) -> MarkerType {
        match self {
            Marker::Vote => MarkerType::Vote,
            Marker::Rank(_) => MarkerType::Rank,
            Marker::Score(_) => MarkerType::Score,
            Marker::Approval(_) => MarkerType::Approval,
            Marker::Continuation => MarkerType::Continuation,
            Marker::None => MarkerType::None,
        }
    }

    /// The rank or score. Zero for every other kind of marker.
    pub fn value(&self) -> u8 {
        match self {
            Marker::Rank(v) | Marker::Score(v) => *v,
            _ => 0,
        }
    }

    /// The canonical token. Parsing it gives back the same marker.
    pub fn token(&self) -> String {
        match self {
            Marker::Vote | Marker::None => "x".to_string(),
            Marker::Rank(v) => format!("#{}", v),
            Marker::Score(v) => format!("+{}", v),
            Marker::Approval(true) => "+".to_string(),
            Marker::Approval(false) => "-".to_string(),
            Marker::Continuation => "*".to_string(),
        }
    }
}

fn single_digit(s: &str) -> Option<u8> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c @ '1'..='9'), None) => Some(c as u8 - b'0'),
        _ => None,
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VoteLineError {
    #[snafu(display("not a vote line"))]
    NotAVoteLine {},
    #[snafu(display("unbalanced brackets in {line:?}"))]
    UnbalancedBrackets { line: String },
    #[snafu(display("unknown marker [{marker}]"))]
    UnknownMarker { marker: String },
    #[snafu(display("no content in {line:?}"))]
    EmptyContent { line: String },
    #[snafu(display("nothing to continue for {line:?}"))]
    OrphanContinuation { line: String },
}

/// Settings that shape the content projections of a line.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub comparer: AgnosticComparer,
    pub trim_extended_text: bool,
}

/// The comparison identity of a line: depth, folded task and simplified content.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct LineKey {
    pub depth: usize,
    pub task: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct VoteLine {
    prefix: String,
    marker: Marker,
    raw_marker: String,
    task: String,
    content: String,
    trimmed_content: String,
    display_content: String,
    comparable_content: String,
    simplified_content: String,
    task_key: String,
    options: ParseOptions,
}

impl VoteLine {
    pub fn parse(line: &str, options: &ParseOptions) -> Result<VoteLine, VoteLineError> {
        let line = line.trim_end();
        let mut depth = 0;
        let mut body_start = line.len();
        for (idx, c) in line.char_indices() {
            match c {
                '-' | '\u{2013}' | '\u{2014}' => depth += 1,
                ' ' | '\t' => {}
                _ => {
                    body_start = idx;
                    break;
                }
            }
        }
        let body = &line[body_start..];
        let after_open = body.strip_prefix('[').context(NotAVoteLineSnafu {})?;
        let close = after_open
            .find(']')
            .context(UnbalancedBracketsSnafu { line })?;
        let token = &after_open[..close];
        ensure!(!token.contains('['), UnbalancedBracketsSnafu { line });
        let token = token.trim();
        ensure!(
            !token.is_empty() && !is_markup_tag(token),
            NotAVoteLineSnafu {}
        );
        let marker = Marker::parse(token).context(UnknownMarkerSnafu { marker: token })?;

        let mut rest = after_open[close + 1..].trim_start();
        let mut task = "";
        if let Some(after_task_open) = rest.strip_prefix('[') {
            let task_close = after_task_open
                .find(']')
                .context(UnbalancedBracketsSnafu { line })?;
            let candidate = &after_task_open[..task_close];
            if !is_markup_tag(candidate) {
                ensure!(!candidate.contains('['), UnbalancedBracketsSnafu { line });
                task = candidate.trim();
                rest = after_task_open[task_close + 1..].trim_start();
            }
        }
        let content = rest.trim();
        ensure!(!content.is_empty(), EmptyContentSnafu { line });

        let mut vl = VoteLine::from_parts(depth, marker, task, content, options);
        // Markup that closes over nothing leaves nothing to show.
        ensure!(!vl.display_content.is_empty(), EmptyContentSnafu { line });
        vl.raw_marker = token.to_string();
        Ok(vl)
    }

    /// Builds a line from its parts, deriving every content projection.
    pub fn from_parts(
        depth: usize,
        marker: Marker,
        task: &str,
        content: &str,
        options: &ParseOptions,
    ) -> VoteLine {
        let content = content.trim().to_string();
        let trimmed_content = if options.trim_extended_text {
            trim_extended_text(&content)
        } else {
            content.clone()
        };
        let display_content = normalize_markup(&trimmed_content);
        // A bare link is compared by its address.
        let comparable_content = match strip_markup(&display_content) {
            stripped if stripped.is_empty() => display_content.clone(),
            stripped => stripped,
        };
        let simplified_content = options.comparer.fold(&comparable_content);
        let task = strip_markup(task);
        VoteLine {
            prefix: "-".repeat(depth),
            marker,
            raw_marker: marker.token(),
            task_key: options.comparer.fold(&task),
            task,
            content,
            trimmed_content,
            display_content,
            comparable_content,
            simplified_content,
            options: *options,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn depth(&self) -> usize {
        self.prefix.len()
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    pub fn marker_type(&self) -> MarkerType {
        self.marker.marker_type()
    }

    pub fn marker_value(&self) -> u8 {
        self.marker.value()
    }

    pub fn raw_marker(&self) -> &str {
        &self.raw_marker
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn trimmed_content(&self) -> &str {
        &self.trimmed_content
    }

    pub fn display_content(&self) -> &str {
        &self.display_content
    }

    pub fn comparable_content(&self) -> &str {
        &self.comparable_content
    }

    pub fn simplified_content(&self) -> &str {
        &self.simplified_content
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn key(&self) -> LineKey {
        LineKey {
            depth: self.depth(),
            task: self.task_key.clone(),
            content: self.simplified_content.clone(),
        }
    }

    /// The line as it is shown in results: no marker, since supporters mark it differently.
    pub fn vote_text(&self) -> String {
        if self.task.is_empty() {
            format!("{}{}", self.prefix, self.display_content)
        } else {
            format!("{}[{}] {}", self.prefix, self.task, self.display_content)
        }
    }

    pub fn with_depth(&self, depth: usize) -> VoteLine {
        VoteLine {
            prefix: "-".repeat(depth),
            ..self.clone()
        }
    }

    pub fn with_task(&self, task: &str) -> VoteLine {
        let task = strip_markup(task);
        VoteLine {
            task_key: self.options.comparer.fold(&task),
            task,
            ..self.clone()
        }
    }

    pub fn with_marker(&self, marker: Marker) -> VoteLine {
        VoteLine {
            marker,
            raw_marker: marker.token(),
            ..self.clone()
        }
    }

    pub fn with_content(&self, content: &str) -> VoteLine {
        let mut vl = VoteLine::from_parts(
            self.depth(),
            self.marker,
            &self.task,
            content,
            &self.options,
        );
        vl.raw_marker = self.raw_marker.clone();
        vl
    }
}

impl PartialEq for VoteLine {
    fn eq(&self, other: &Self) -> bool {
        self.depth() == other.depth()
            && self.task_key == other.task_key
            && self.simplified_content == other.simplified_content
    }
}

impl Eq for VoteLine {}

impl Hash for VoteLine {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.depth().hash(state);
        self.task_key.hash(state);
        self.simplified_content.hash(state);
    }
}

impl Display for VoteLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.prefix, self.marker.token())?;
        if !self.task.is_empty() {
            write!(f, "[{}]", self.task)?;
        } else if self.display_content.starts_with('[')
            && !self.display_content[1..]
                .split(']')
                .next()
                .map(is_markup_tag)
                .unwrap_or(false)
        {
            // Keeps a leading bracket of the content from being read as a task.
            write!(f, "[]")?;
        }
        write!(f, " {}", self.display_content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agnostic::AgnosticComparer;

    fn opts() -> ParseOptions {
        ParseOptions::default()
    }

    fn parse(s: &str) -> VoteLine {
        VoteLine::parse(s, &opts()).unwrap()
    }

    #[test]
    fn parses_all_marker_kinds() {
        assert_eq!(parse("[x] a").marker(), Marker::Vote);
        assert_eq!(parse("[X] a").marker(), Marker::Vote);
        assert_eq!(parse("[✓] a").marker(), Marker::Vote);
        assert_eq!(parse("[✔] a").marker(), Marker::Vote);
        assert_eq!(parse("[3] a").marker(), Marker::Rank(3));
        assert_eq!(parse("[#3] a").marker(), Marker::Rank(3));
        assert_eq!(parse("[+3] a").marker(), Marker::Score(3));
        assert_eq!(parse("[+] a").marker(), Marker::Approval(true));
        assert_eq!(parse("[-] a").marker(), Marker::Approval(false));
        assert_eq!(parse("[*] a").marker(), Marker::Continuation);
        assert_eq!(parse("[ x ] a").raw_marker(), "x");
    }

    #[test]
    fn marker_values_only_for_rank_and_score() {
        assert_eq!(parse("[#7] a").marker_value(), 7);
        assert_eq!(parse("[+2] a").marker_value(), 2);
        assert_eq!(parse("[x] a").marker_value(), 0);
        assert_eq!(parse("[+] a").marker_value(), 0);
        assert_eq!(parse("[+2] a").marker_type(), MarkerType::Score);
    }

    #[test]
    fn rejects_bad_markers() {
        let o = opts();
        assert_eq!(
            VoteLine::parse("[10] a", &o),
            Err(VoteLineError::UnknownMarker {
                marker: "10".to_string()
            })
        );
        assert!(matches!(
            VoteLine::parse("[#0] a", &o),
            Err(VoteLineError::UnknownMarker { .. })
        ));
        assert!(matches!(
            VoteLine::parse("[y] a", &o),
            Err(VoteLineError::UnknownMarker { .. })
        ));
        assert!(matches!(
            VoteLine::parse("[x a", &o),
            Err(VoteLineError::UnbalancedBrackets { .. })
        ));
        assert!(matches!(
            VoteLine::parse("[x] [task a", &o),
            Err(VoteLineError::UnbalancedBrackets { .. })
        ));
        assert!(matches!(
            VoteLine::parse("[x]   ", &o),
            Err(VoteLineError::EmptyContent { .. })
        ));
    }

    #[test]
    fn markup_without_text_is_empty() {
        let o = opts();
        for s in ["[x] [spoiler]", "[x] [spoiler][/spoiler]", "[x] [b][/b]", "[x] <b></b>"] {
            assert!(
                matches!(
                    VoteLine::parse(s, &o),
                    Err(VoteLineError::EmptyContent { .. })
                ),
                "{}",
                s
            );
        }
    }

    #[test]
    fn bare_links_are_compared_by_address() {
        let a = parse("[x] https://example.com/plan-a");
        let b = parse("[x] https://example.com/plan-b");
        assert!(!a.simplified_content().is_empty());
        assert_ne!(a, b);
        assert_eq!(a, parse("[x] HTTPS://example.com/plan-a"));
        let again = parse(&a.to_string());
        assert_eq!(a, again);
    }

    #[test]
    fn plain_text_is_not_a_vote_line() {
        let o = opts();
        for s in ["just talking", "[b]Bold[/b] talk", "[ ] unchecked", "- list item"] {
            assert_eq!(
                VoteLine::parse(s, &o),
                Err(VoteLineError::NotAVoteLine {}),
                "{}",
                s
            );
        }
    }

    #[test]
    fn reads_prefix_task_and_content() {
        let vl = parse("- - [x] [How?] A line");
        assert_eq!(vl.prefix(), "--");
        assert_eq!(vl.depth(), 2);
        assert_eq!(vl.task(), "How?");
        assert_eq!(vl.content(), "A line");
        let vl = parse("—[x] dashes");
        assert_eq!(vl.depth(), 1);
        let vl = parse("[x] [b]bold[/b] start");
        assert_eq!(vl.task(), "");
        assert_eq!(vl.display_content(), "[b]bold[/b] start");
        assert_eq!(vl.comparable_content(), "bold start");
    }

    #[test]
    fn equivalent_lines_under_default_comparison() {
        let a = parse("- - [x] [How?] A line");
        let b = parse("--[X][how?] a line ");
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn distinct_lines_under_case_sensitive_comparison() {
        let o = ParseOptions {
            comparer: AgnosticComparer::CASE_SENSITIVE,
            trim_extended_text: false,
        };
        let a = VoteLine::parse("- - [x] [How?] A line", &o).unwrap();
        let b = VoteLine::parse("--[X][how?] a line ", &o).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn marker_does_not_take_part_in_equality() {
        assert_eq!(parse("[1] Apple"), parse("[x] apple"));
        assert_ne!(parse("[x] Apple"), parse("-[x] Apple"));
    }

    #[test]
    fn display_form_parses_back_to_the_same_line() {
        for s in [
            "- - [x] [How?] A line",
            "[#2] Banana",
            "[+4][Score] Cherry  pie",
            "-[-] <b>no</b> thanks",
            "[x][Task] [Note] bracketed",
            "[x] [url=https://example.com]Link[/url] here",
        ] {
            let vl = parse(s);
            let again = parse(&vl.to_string());
            assert_eq!(vl, again, "{}", s);
            assert_eq!(vl.marker(), again.marker());
            assert_eq!(vl.display_content(), again.display_content());
        }
        let built = parse("[x] plain").with_content("[Note] bracketed");
        let again = parse(&built.to_string());
        assert_eq!(built, again);
        assert_eq!(again.task(), "");
    }

    #[test]
    fn trimming_is_optional() {
        let o = ParseOptions {
            comparer: AgnosticComparer::DEFAULT,
            trim_extended_text: true,
        };
        let s = "[x] Go north: because the weather is nicer there and the roads are better";
        let vl = VoteLine::parse(s, &o).unwrap();
        assert_eq!(vl.trimmed_content(), "Go north");
        assert_eq!(vl, parse("[x] go north"));
        assert_eq!(parse(s).trimmed_content(), parse(s).content());
    }

    #[test]
    fn builders_return_new_lines() {
        let vl = parse("-[x][A] thing");
        assert_eq!(vl.with_depth(0).depth(), 0);
        assert_eq!(vl.depth(), 1);
        assert_eq!(vl.with_task("B").task(), "B");
        assert_eq!(vl.with_marker(Marker::Rank(1)).marker_value(), 1);
        assert_eq!(vl.with_content("other").display_content(), "other");
        assert_eq!(vl.vote_text(), "-[A] thing");
    }
}
