use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use svault::config::load_config;
use svault::domain::config::VaultConfig;
use svault_bridge::{Bridge, FixedPrompt, PromptMode};
use svault_logger::{Logger, parse_level};

/// JSON-lines bridge to the secure vault. Requests on stdin, replies on stdout, logs on
/// stderr.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file; `svault.*` in the working directory when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How authentication prompts are answered.
    #[arg(short, long, value_enum, default_value_t = PromptMode::Approve)]
    prompt: PromptMode,

    /// Application password for paranoid namespaces.
    #[arg(long, env = "SVAULT_APP_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cfg: VaultConfig =
        load_config(args.config.as_deref()).context("Critical: Configuration is malformed")?;

    let level = parse_level(&cfg.logging.level)?;
    let logger = Logger::builder().name(env!("CARGO_PKG_NAME")).console(true).level(level);
    let _log = match &cfg.logging.directory {
        Some(dir) => logger.path(dir.clone()).json(cfg.logging.json).init()?,
        None => logger.init()?,
    };

    let mut prompt = FixedPrompt::new(args.prompt);
    if let Some(password) = args.password {
        prompt = prompt.with_password(password);
    }

    Bridge::builder().config(cfg).prompt(prompt).build().await?.run_stdio().await
}
