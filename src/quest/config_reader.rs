use crate::quest::*;

/// The configuration file of a quest.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestConfig {
    #[serde(rename = "questName")]
    pub quest_name: Option<String>,
    pub input: Option<String>,
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    pub output: Option<String>,
    #[serde(rename = "startPost")]
    pub start_post: Option<u32>,
    #[serde(rename = "endPost")]
    pub end_post: Option<u32>,
    #[serde(rename = "partitionMode")]
    pub partition_mode: Option<String>,
    #[serde(rename = "rankCounter")]
    pub rank_counter: Option<String>,
    #[serde(rename = "caseSensitive")]
    pub case_sensitive: Option<bool>,
    #[serde(rename = "symbolsSignificant")]
    pub symbols_significant: Option<bool>,
    #[serde(rename = "trimExtendedText")]
    pub trim_extended_text: Option<bool>,
    #[serde(rename = "forbidPlanVoterNames")]
    pub forbid_plan_voter_names: Option<bool>,
}

/// The settings repeated at the top of a summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "questName")]
    pub quest_name: Option<String>,
    #[serde(rename = "partitionMode")]
    pub partition_mode: String,
    #[serde(rename = "rankCounter")]
    pub rank_counter: String,
}

pub fn read_config(path: &str) -> QuestResult<QuestConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: QuestConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> QuestResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Lays the values that are set in `overrides` over the configuration.
pub fn apply_overrides(config: QuestConfig, overrides: &QuestConfig) -> QuestConfig {
    QuestConfig {
        quest_name: overrides.quest_name.clone().or(config.quest_name),
        input: overrides.input.clone().or(config.input),
        input_type: overrides.input_type.clone().or(config.input_type),
        output: overrides.output.clone().or(config.output),
        start_post: overrides.start_post.or(config.start_post),
        end_post: overrides.end_post.or(config.end_post),
        partition_mode: overrides.partition_mode.clone().or(config.partition_mode),
        rank_counter: overrides.rank_counter.clone().or(config.rank_counter),
        case_sensitive: overrides.case_sensitive.or(config.case_sensitive),
        symbols_significant: overrides.symbols_significant.or(config.symbols_significant),
        trim_extended_text: overrides.trim_extended_text.or(config.trim_extended_text),
        forbid_plan_voter_names: overrides
            .forbid_plan_voter_names
            .or(config.forbid_plan_voter_names),
    }
}

pub fn partition_mode_name(mode: PartitionMode) -> &'static str {
    match mode {
        PartitionMode::None => "none",
        PartitionMode::ByLine => "byLine",
        PartitionMode::ByBlock => "byBlock",
        PartitionMode::ByBlockAll => "byBlockAll",
    }
}

pub fn rank_counter_name(method: RankVoteCounterMethod) -> &'static str {
    match method {
        RankVoteCounterMethod::Wilson => "wilson",
        RankVoteCounterMethod::Baldwin => "baldwin",
        RankVoteCounterMethod::Rirv => "rirv",
        RankVoteCounterMethod::Schulze => "schulze",
    }
}

pub fn validate_options(config: &QuestConfig) -> QuestResult<QuestOptions> {
    let default = QuestOptions::DEFAULT;
    let res = QuestOptions {
        partition_mode: match config.partition_mode.as_deref() {
            None => default.partition_mode,
            Some("none") => PartitionMode::None,
            Some("byLine") => PartitionMode::ByLine,
            Some("byBlock") => PartitionMode::ByBlock,
            Some("byBlockAll") => PartitionMode::ByBlockAll,
            Some(x) => {
                whatever!("Cannot use partition mode {:?}: unknown mode", x)
            }
        },
        comparison: ComparisonConfig {
            case_sensitive: config
                .case_sensitive
                .unwrap_or(default.comparison.case_sensitive),
            symbols_significant: config
                .symbols_significant
                .unwrap_or(default.comparison.symbols_significant),
        },
        rank_counter: match config.rank_counter.as_deref() {
            None => default.rank_counter,
            Some("wilson") => RankVoteCounterMethod::Wilson,
            Some("baldwin") => RankVoteCounterMethod::Baldwin,
            Some("rirv") => RankVoteCounterMethod::Rirv,
            Some("schulze") => RankVoteCounterMethod::Schulze,
            Some(x) => {
                whatever!("Cannot use rank counter {:?}: unknown method", x)
            }
        },
        trim_extended_text: config
            .trim_extended_text
            .unwrap_or(default.trim_extended_text),
        forbid_plan_voter_names: config
            .forbid_plan_voter_names
            .unwrap_or(default.forbid_plan_voter_names),
    };
    if let (Some(start), Some(end)) = (config.start_post, config.end_post) {
        if start > end {
            whatever!("startPost ({}) is after endPost ({})", start, end)
        }
    }
    Ok(res)
}
