use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scout_clients::{JinaReader, OpenRouterProvider, SerpApiSearch};
use scout_core::{
    CompletionProvider, ContentProvider, Orchestrator, SearchProvider, SynthesizerOptions,
    DEFAULT_MAX_CONTEXT_CHARS,
};

mod config;

use config::Config;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose: all tracing including per-URL collection details
    Trace,
    /// Verbose: planner decisions, search results, truncation events
    Debug,
    /// Standard: high-level run flow, iteration progress
    Info,
    /// Quiet: only warnings and errors
    Warn,
    /// Minimal: only errors
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "deepscout")]
#[command(author, version, about = "Iterative web research agent", long_about = None)]
pub struct Cli {
    /// Research topic
    pub topic: String,

    /// Model to use for every completion call (overrides config default)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Cap on the evidence context handed to the report synthesizer,
    /// in characters (0 disables the cap)
    #[arg(long)]
    pub max_context_chars: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn synthesizer_options(cli: &Cli, config: &Config) -> SynthesizerOptions {
    let configured = cli
        .max_context_chars
        .or(config.report.max_context_chars)
        .unwrap_or(DEFAULT_MAX_CONTEXT_CHARS);

    SynthesizerOptions {
        max_context_chars: (configured > 0).then_some(configured),
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = Config::load().context("failed to load configuration")?;

    let mut completion = OpenRouterProvider::new(config.openrouter_key()?);
    if let Some(base_url) = &config.openrouter.base_url {
        completion = completion.with_base_url(base_url);
    }
    if let Some(model) = cli.model.clone().or_else(|| config.openrouter.model.clone()) {
        completion = completion.with_default_model(model);
    }

    let search = SerpApiSearch::new(config.serpapi_key()?);
    let content = JinaReader::new(config.jina_key());

    let orchestrator = Orchestrator::new(
        Arc::new(completion) as Arc<dyn CompletionProvider>,
        Arc::new(search) as Arc<dyn SearchProvider>,
        Arc::new(content) as Arc<dyn ContentProvider>,
    )
    .with_synthesizer_options(synthesizer_options(&cli, &config));

    Ok(orchestrator.run(&cli.topic).await?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(report) => println!("{report}"),
        Err(e) => {
            eprintln!("Research failed: {e:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_cli_parses_topic() {
        let cli = cli(&["deepscout", "rust async runtimes"]);
        assert_eq!(cli.topic, "rust async runtimes");
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_synthesizer_options_default_cap() {
        let cli = cli(&["deepscout", "t"]);
        let options = synthesizer_options(&cli, &Config::default());
        assert_eq!(options.max_context_chars, Some(DEFAULT_MAX_CONTEXT_CHARS));
    }

    #[test]
    fn test_synthesizer_options_zero_disables_cap() {
        let cli = cli(&["deepscout", "t", "--max-context-chars", "0"]);
        let options = synthesizer_options(&cli, &Config::default());
        assert_eq!(options.max_context_chars, None);
    }

    #[test]
    fn test_synthesizer_options_flag_overrides_config() {
        let cli = cli(&["deepscout", "t", "--max-context-chars", "1000"]);
        let mut config = Config::default();
        config.report.max_context_chars = Some(9999);
        let options = synthesizer_options(&cli, &config);
        assert_eq!(options.max_context_chars, Some(1000));
    }
}
