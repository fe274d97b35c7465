use clap::Parser;

use crate::quest::config_reader::QuestConfig;

/// Tallies the votes cast in a forum quest thread.
///
/// Every setting can come from the configuration file given with --config. The
/// values passed on the command line take precedence over it.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The configuration of the quest, in JSON.
    /// The format is described in the `manual` module of the quest_tally library.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) An expected summary in JSON. If provided, qtally fails when the
    /// summary of the tally differs from it and prints the differences.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Posts and summary
    /// (file path) The dump of the thread to tally.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,
    /// (default json) How the dump is written: 'json' for an array of posts, 'text' for
    /// posts separated by '=== author #postId' headers.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,
    /// (file path or 'stdout', default stdout) Where the JSON summary is written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,
    /// Posts numbered before this one are not tallied.
    #[clap(long, value_parser)]
    pub start_post: Option<u32>,
    /// Posts numbered after this one are not tallied.
    #[clap(long, value_parser)]
    pub end_post: Option<u32>,

    // Tally settings
    /// (default byBlock) How votes are cut into units: 'none', 'byLine', 'byBlock' or 'byBlockAll'.
    #[clap(short, long, value_parser)]
    pub partition_mode: Option<String>,
    /// (default baldwin) The method for ranked tasks: 'wilson', 'baldwin', 'rirv' or 'schulze'.
    #[clap(short = 'm', long, value_parser)]
    pub rank_counter: Option<String>,
    /// Votes that differ only by case are counted apart.
    #[clap(long, takes_value = false)]
    pub case_sensitive: bool,
    /// Votes that differ only by whitespace or punctuation are counted apart.
    #[clap(long, takes_value = false)]
    pub symbols_significant: bool,
    /// Cuts the explanations that follow a vote before comparing it.
    #[clap(long, takes_value = false)]
    pub trim_extended_text: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl Args {
    /// The settings given on the command line, to lay over the configuration.
    pub fn overrides(&self) -> QuestConfig {
        QuestConfig {
            input: self.input.clone(),
            input_type: self.input_type.clone(),
            output: self.out.clone(),
            start_post: self.start_post,
            end_post: self.end_post,
            partition_mode: self.partition_mode.clone(),
            rank_counter: self.rank_counter.clone(),
            case_sensitive: flag(self.case_sensitive),
            symbols_significant: flag(self.symbols_significant),
            trim_extended_text: flag(self.trim_extended_text),
            ..QuestConfig::default()
        }
    }
}
