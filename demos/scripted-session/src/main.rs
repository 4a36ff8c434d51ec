//! Replays a scripted conversation through a configurable memory store.
//!
//! ```text
//! RUST_LOG=convo_memory=debug cargo run -p scripted-session -- --query "museum"
//! cargo run -p scripted-session -- --config memory.json --structured
//! ```

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use convo_memory::{
    AnyMemory, HashingEmbedder, LanguageModel, MemoryConfig, MemoryOptions, MemoryResult,
    MemoryStore,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SCRIPT: &[&str] = &[
    "What is the weather like in Paris?",
    "Recommend a museum there.",
    "How do I get there from the airport?",
    "What should I eat for dinner in Paris?",
    "Remind me what museum you suggested.",
];

#[derive(Debug, Parser)]
#[command(about = "Replay a scripted conversation through a memory store")]
struct Args {
    /// JSON memory configuration, e.g. {"strategy": "summary", "capacity": 2}.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Similarity query used when rendering semantic memory.
    #[arg(long)]
    query: Option<String>,
    /// Render the memory as JSON instead of a transcript.
    #[arg(long)]
    structured: bool,
}

/// Offline stand-in for a chat model.
struct ScriptedModel;

impl LanguageModel for ScriptedModel {
    fn predict(&self, prompt: &str) -> MemoryResult<Value> {
        if prompt.ends_with("New summary:") {
            let topics: Vec<&str> = prompt
                .lines()
                .filter_map(|line| line.strip_prefix("Human: "))
                .collect();
            return Ok(Value::from(format!("The user asked: {}", topics.join(" / "))));
        }
        Ok(Value::from(format!("Here is what I know about \"{prompt}\".")))
    }
}

/// Picks the strategy: the file when given, otherwise a window of three turns,
/// or a semantic store over the whole script when a query is asked for.
fn load_config(path: Option<&PathBuf>, query: bool) -> Result<MemoryConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading memory config {}", path.display()))?;
            MemoryConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None if query => MemoryConfig::Semantic {
            capacity: NonZeroUsize::new(SCRIPT.len()).context("empty script")?,
        },
        None => MemoryConfig::Window {
            capacity: NonZeroUsize::new(3).context("default capacity")?,
            max_total_bytes: None,
        },
    };
    if query && !matches!(config, MemoryConfig::Semantic { .. }) {
        bail!("--query needs the semantic strategy");
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref(), args.query.is_some())?;
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel);

    let mut memory = AnyMemory::builder(config)
        .with_model(model.clone())
        .with_embedder(Arc::new(HashingEmbedder::default()))
        .build()?;
    info!(strategy = memory.strategy(), capacity = %memory.capacity(), "memory ready");

    for prompt in SCRIPT {
        let response = model.predict(prompt)?;
        memory.add_memory(prompt, response)?;
        info!(prompt, retained = memory.len(), "turn recorded");
    }

    let mut options = MemoryOptions::new();
    if let Some(query) = args.query {
        options = options.with("query", query);
    }
    if args.structured {
        options = options.with("format", "structured");
    }

    println!("{}", memory.get_memory(&options)?);
    Ok(())
}
