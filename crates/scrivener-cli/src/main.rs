use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use scrivener_ai::{EditingService, GatewayClient};
use scrivener_core::config::{
    DEFAULT_BACKOFF_MS, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};
use scrivener_core::{
    CheckRequest, ConversationTurn, EditRequest, GatewayConfig, PolishRequest, RewriteRequest,
    TranslateRequest,
};

mod display;

#[derive(Parser)]
#[command(
    name = "scrivener",
    version,
    about = "Check, polish, translate and rewrite technical documents with an LLM"
)]
struct Cli {
    /// API key for the completions endpoint.
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint root; `/chat/completions` is appended.
    #[arg(long, env = "AI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "AI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Per-attempt timeout in seconds.
    #[arg(long, env = "AI_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Attempts per request, including the first.
    #[arg(long, env = "AI_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Backoff unit in milliseconds (doubles after each failed attempt).
    #[arg(long, env = "AI_BACKOFF_MS", default_value_t = DEFAULT_BACKOFF_MS)]
    backoff_ms: u64,

    /// Caller identity recorded in logs and conversation ids.
    #[arg(long, env = "SCRIVENER_USER", default_value = "local")]
    user: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON result.
    Json,
    /// Inline diff with change markers.
    Diff,
}

/// Where the text to process comes from; stdin when neither is given.
#[derive(Args)]
struct Input {
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    #[arg(long)]
    file: Option<PathBuf>,
}

impl Input {
    fn read(&self) -> anyhow::Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading text from stdin")?;
        Ok(text)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Find grammar, style, terminology and consistency problems.
    Check {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        no_grammar: bool,
        #[arg(long)]
        no_style: bool,
        #[arg(long)]
        no_terminology: bool,
        #[arg(long)]
        no_consistency: bool,
        #[arg(long)]
        strict: bool,
    },
    /// Improve wording while keeping the meaning.
    Polish {
        #[command(flatten)]
        input: Input,
        /// clarity, conciseness, tone, structure or all.
        #[arg(long)]
        focus: Option<String>,
        /// technical, general, beginner or expert.
        #[arg(long)]
        audience: Option<String>,
    },
    /// Translate into another language.
    Translate {
        #[command(flatten)]
        input: Input,
        #[arg(long, default_value = "auto")]
        from: String,
        #[arg(long)]
        to: String,
        /// Allow technical terms to be localised.
        #[arg(long)]
        loose_terminology: bool,
    },
    /// Rewrite following a free-form instruction.
    Rewrite {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        instruction: String,
        /// JSON array of prior `{role, content}` turns.
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

impl Cli {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.api_key.clone().unwrap_or_default())
            .with_base_url(self.base_url.as_str())
            .with_model(self.model.as_str())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_retries(self.max_retries)
            .with_backoff_base(Duration::from_millis(self.backoff_ms))
    }
}

fn read_history(path: &Path) -> anyhow::Result<Vec<ConversationTurn>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading history {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing history {}", path.display()))
}

fn build_request(command: Command) -> anyhow::Result<EditRequest> {
    let request = match command {
        Command::Check {
            input,
            no_grammar,
            no_style,
            no_terminology,
            no_consistency,
            strict,
        } => {
            let mut req = CheckRequest::new(input.read()?);
            req.enable_grammar = !no_grammar;
            req.enable_style = !no_style;
            req.enable_terminology = !no_terminology;
            req.enable_consistency = !no_consistency;
            req.strict_mode = strict;
            EditRequest::Check(req)
        }
        Command::Polish {
            input,
            focus,
            audience,
        } => {
            let mut req = PolishRequest::new(input.read()?);
            req.focus_on = focus;
            req.target_audience = audience;
            EditRequest::Polish(req)
        }
        Command::Translate {
            input,
            from,
            to,
            loose_terminology,
        } => {
            let mut req = TranslateRequest::new(input.read()?, to);
            req.language = from;
            req.preserve_terminology = !loose_terminology;
            EditRequest::Translate(req)
        }
        Command::Rewrite {
            input,
            instruction,
            history,
        } => {
            let mut req = RewriteRequest::new(input.read()?, instruction);
            if let Some(path) = &history {
                req.conversation_history = read_history(path)?;
            }
            EditRequest::Rewrite(req)
        }
    };
    Ok(request)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = cli.gateway_config();
    config.validate().context("invalid gateway configuration")?;
    tracing::debug!(?config, "scrivener v{}", env!("CARGO_PKG_VERSION"));

    let request = build_request(cli.command)?;
    let service = EditingService::new(GatewayClient::new(Arc::new(config)));
    let result = service.edit(&request, &cli.user).await?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Diff => print!("{}", display::render(&result)),
    }
    Ok(())
}
