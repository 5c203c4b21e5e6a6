//! Command implementations behind the `soc-sync` binary
//!
//! Every command takes file contents and returns the text to print, so the
//! binary only handles arguments, file reads and logging setup.

#![warn(unreachable_pub)]

use anyhow::{Context, Result};
use serde_json::Value;
use soc_model::{Framework, QuestionCode};
use soc_scoring::{compute_scores, domain_progress};
use soc_store::{parse_action_plan, StoreConfig};
use std::collections::BTreeMap;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber on stderr
///
/// `RUST_LOG` wins when set; otherwise `info`.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

/// Read a text file with the path in the error
///
/// # Errors
///
/// When the file cannot be read.
pub fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Configuration from `--config`, or defaults
///
/// # Errors
///
/// When the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<StoreConfig> {
    match path {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("invalid configuration {}", path.display())),
        None => Ok(StoreConfig::default()),
    }
}

/// Framework taxonomy in `{ "tree": ... }` form; the id is the file stem
///
/// # Errors
///
/// When the JSON is not a framework tree.
pub fn parse_framework(id: &str, text: &str) -> Result<Framework> {
    Framework::from_tree_json(id, id, text).with_context(|| format!("invalid framework {id}"))
}

/// Answers as a bare `code -> answer` map or inside an `answers` field
///
/// Non-string values are ignored.
///
/// # Errors
///
/// When the text is not a JSON object.
pub fn parse_answers(text: &str) -> Result<BTreeMap<QuestionCode, String>> {
    let value: Value = serde_json::from_str(text).context("answers are not valid JSON")?;
    let map = match value {
        Value::Object(mut map) => match map.remove("answers") {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                map.insert("answers".into(), other);
                map
            }
            None => map,
        },
        _ => anyhow::bail!("answers must be a JSON object"),
    };
    Ok(map
        .into_iter()
        .filter_map(|(code, v)| match v {
            Value::String(answer) => Some((code, answer)),
            _ => None,
        })
        .collect())
}

/// `score`: scores as pretty JSON
///
/// # Errors
///
/// When the inputs do not parse.
pub fn score(framework: &Framework, answers: &str) -> Result<String> {
    let scores = compute_scores(framework, &parse_answers(answers)?);
    Ok(serde_json::to_string_pretty(&scores)?)
}

/// `progress`: per-domain completion as pretty JSON
///
/// # Errors
///
/// When the inputs do not parse.
pub fn progress(framework: &Framework, answers: &str) -> Result<String> {
    let progress = domain_progress(framework, &parse_answers(answers)?);
    Ok(serde_json::to_string_pretty(&progress)?)
}

/// `hydrate`: any persisted blob to the current schema
///
/// Unreadable input yields a fresh state, matching what the app does at
/// startup.
///
/// # Errors
///
/// When serialization fails.
pub fn hydrate(blob: &str, config: &StoreConfig) -> Result<String> {
    let state = soc_hydrate::hydrate_str(blob, &config.hydrate_options());
    tracing::info!(
        workspaces = state.workspaces.len(),
        current = %state.current_assessment.id,
        "hydrated"
    );
    Ok(serde_json::to_string_pretty(&soc_hydrate::dehydrate(&state))?)
}

/// `parse-plan`: plan markdown split into sections
///
/// # Errors
///
/// When serialization fails.
pub fn parse_plan(markdown: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&parse_action_plan(markdown))?)
}
