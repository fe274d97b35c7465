use log::{debug, info, warn};

use quest_tally::partition::is_plan_voter;
use quest_tally::storage::StoredVote;
use quest_tally::vote_line::Marker;
use quest_tally::vote_node::VoteNode;
use quest_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::quest::config_reader::*;
use crate::quest::io_common::{keep_range, resolve_path};

pub mod config_reader;
mod io_common;
mod io_json;
mod io_text;

#[derive(Debug, Snafu)]
pub enum QuestError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening input {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid post: {source}"))]
    InvalidPost { source: TallyError },
    #[snafu(display("Line {lineno}: could not read the post header {line:?}"))]
    TextHeader { lineno: usize, line: String },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The tally failed: {source}"))]
    Tallying { source: TallyError },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type QuestResult<T> = Result<T, QuestError>;

fn vote_type_name(vote_type: VoteType) -> &'static str {
    match vote_type {
        VoteType::Vote => "vote",
        VoteType::Plan => "plan",
        VoteType::Rank => "rank",
        VoteType::Approval => "approval",
    }
}

fn node_to_json(node: &VoteNode) -> JSValue {
    let children: Vec<JSValue> = node.children.iter().map(node_to_json).collect();
    json!({
        "vote": node.text,
        "count": node.voter_count(),
        "voters": node.all_voters,
        "planReference": node.plan_reference,
        "children": children
    })
}

fn stored_vote_to_json(vote_type: VoteType, vote: &StoredVote) -> JSValue {
    let people: Vec<(&String, &Marker)> = vote
        .supporters
        .iter()
        .filter(|(voter, _)| !is_plan_voter(voter))
        .collect();
    if vote_type == VoteType::Approval {
        let approve = people
            .iter()
            .filter(|(_, m)| **m == Marker::Approval(true))
            .count();
        json!({
            "vote": vote.text(),
            "approve": approve,
            "disapprove": people.len() - approve,
            "voters": vote.voters()
        })
    } else {
        json!({
            "vote": vote.text(),
            "count": people.len(),
            "voters": vote.voters()
        })
    }
}

fn ranked_to_json(results: &[RankedResult]) -> Vec<JSValue> {
    results
        .iter()
        .map(|r| json!({"rank": r.rank, "score": r.score, "vote": r.vote}))
        .collect()
}

fn build_summary_js(config: &QuestConfig, options: &QuestOptions, results: &TallyResults) -> JSValue {
    let c = OutputConfig {
        quest_name: config.quest_name.clone(),
        partition_mode: partition_mode_name(options.partition_mode).to_string(),
        rank_counter: rank_counter_name(options.rank_counter).to_string(),
    };

    let tasks: JSMap<String, JSValue> = results
        .nodes
        .iter()
        .map(|(task, nodes)| {
            let l: Vec<JSValue> = nodes.iter().map(node_to_json).collect();
            (task.clone(), JSValue::Array(l))
        })
        .collect();

    let ranked: JSMap<String, JSValue> = results
        .ranked
        .iter()
        .map(|(task, rs)| (task.clone(), JSValue::Array(ranked_to_json(rs))))
        .collect();

    let mut votes: JSMap<String, JSValue> = JSMap::new();
    for vote_type in VoteType::ALL {
        let stored = results.storage.votes(vote_type);
        if !stored.is_empty() {
            let l: Vec<JSValue> = stored
                .iter()
                .map(|v| stored_vote_to_json(vote_type, v))
                .collect();
            votes.insert(vote_type_name(vote_type).to_string(), JSValue::Array(l));
        }
    }

    let plans: Vec<JSValue> = results
        .plans
        .iter()
        .map(|p| json!({"name": p.display_name(), "author": p.author, "postId": p.post_id}))
        .collect();

    let failures: Vec<JSValue> = results
        .failures
        .iter()
        .map(|f| {
            json!({
                "author": f.author,
                "postId": f.post_id,
                "line": f.failure.line_number,
                "error": f.failure.error.to_string()
            })
        })
        .collect();

    json!({
        "config": c,
        "voters": results.voter_count(),
        "tasks": tasks,
        "ranked": ranked,
        "votes": votes,
        "plans": plans,
        "failures": failures
    })
}

fn read_posts(path: &str, input_type: &str) -> QuestResult<Vec<Post>> {
    info!("Attempting to read posts from {:?} ({})", path, input_type);
    match input_type {
        "json" => io_json::read_json_posts(path),
        "text" => io_text::read_text_posts(path),
        x => whatever!("Input type {:?} not implemented", x),
    }
}

/// Runs a tally from a configuration file and prints or writes the summary.
///
/// The values set in `overrides` take precedence over the configuration.
/// Relative paths of the configuration are relative to its directory; those
/// of `overrides` are taken as they are.
pub fn run_quest(
    config_path: Option<String>,
    check_summary_path: Option<String>,
    overrides: &QuestConfig,
) -> QuestResult<JSValue> {
    let file_config = match config_path {
        Some(p) => {
            let mut config = read_config(&p)?;
            let root = Path::new(&p).parent();
            config.input = config.input.map(|i| resolve_path(root, &i));
            config.output = config.output.map(|o| resolve_path(root, &o));
            config
        }
        None => QuestConfig::default(),
    };
    let config = apply_overrides(file_config, overrides);
    info!("config: {:?}", config);

    // Validate the options:
    let options = validate_options(&config)?;

    let input_path = match config.input.as_ref() {
        Some(p) => p,
        None => {
            whatever!("No input given: use --input or the 'input' key of the configuration")
        }
    };
    let input_type = config.input_type.as_deref().unwrap_or("json");
    let posts = keep_range(
        read_posts(input_path, input_type)?,
        config.start_post,
        config.end_post,
    );
    info!("read {} posts", posts.len());

    let mut tally = Tally::new(&options);
    let results = tally
        .run(&posts, &CancellationToken::new())
        .context(TallyingSnafu {})?;
    debug!("results: {:?}", results.ranked);

    // Assemble the final json
    let result_js = build_summary_js(&config, &options, results);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match config.output.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(p) => {
            info!("Writing summary to {:?}", p);
            fs::write(p, &pretty_js_stats).context(WritingOutputSnafu { path: p })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu { path: summary_p }.fail();
        }
    }

    Ok(result_js)
}
