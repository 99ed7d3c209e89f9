//! # Vault Bridge
//!
//! Exposes the vault to a host process as JSON-lines commands over a byte stream
//! (stdin/stdout for the binary). Every request runs on its own task; replies are written
//! as they complete and carry the request `id`. The authentication session still
//! serializes vault work, so replies to state-changing commands keep their order.
//!
//! ## Example
//! ```no_run
//! use svault_bridge::{Bridge, FixedPrompt, PromptMode};
//! use svault::domain::config::VaultConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Bridge::builder()
//!         .config(VaultConfig::default())
//!         .prompt(FixedPrompt::new(PromptMode::Approve))
//!         .build()
//!         .await?
//!         .run_stdio()
//!         .await
//! }
//! ```

mod dispatch;
pub mod error;
mod prompt;
mod protocol;

pub use dispatch::Dispatcher;
pub use error::BridgeError;
pub use prompt::{FixedPrompt, PromptMode};
pub use protocol::{Command, ErrorBody, Reply, Request, parse_request};

use anyhow::{Context, Result};
use std::sync::Arc;
use svault::domain::config::VaultConfig;
use svault::{SoftwareKeyStore, Vault};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const REPLY_QUEUE: usize = 64;

/// A fluent builder for the [`Bridge`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct BridgeBuilder {
    cfg: VaultConfig,
    prompt: Option<FixedPrompt>,
}

impl BridgeBuilder {
    pub fn config(mut self, cfg: VaultConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn prompt(mut self, prompt: FixedPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Opens the vault over the software secure element configured in `keystore`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be opened.
    pub async fn build(self) -> Result<Bridge> {
        let prompt = self.prompt.unwrap_or_else(|| FixedPrompt::new(PromptMode::default()));

        info!(
            strategy = ?self.cfg.keystore.strategy,
            data_dir = %self.cfg.storage.data_dir.display(),
            "Initializing bridge"
        );

        let vault = Vault::builder()
            .hardware(SoftwareKeyStore::from_config(&self.cfg.keystore))
            .prompt(prompt)
            .config(&self.cfg)
            .connect()
            .await
            .context("Failed to open the vault")?;

        Ok(Bridge { dispatcher: Arc::new(Dispatcher::new(vault)) })
    }
}

/// A bridge ready to serve requests.
#[must_use = "call .run_stdio().await or .serve(..).await to start the bridge"]
#[derive(Debug, Clone)]
pub struct Bridge {
    dispatcher: Arc<Dispatcher>,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    #[must_use]
    pub fn vault(&self) -> &Vault {
        self.dispatcher.vault()
    }

    /// Serves stdin/stdout until stdin closes or Ctrl+C arrives.
    ///
    /// # Errors
    /// Returns an error if stdin or stdout fail.
    pub async fn run_stdio(self) -> Result<()> {
        let input = BufReader::new(tokio::io::stdin());
        let output = tokio::io::stdout();

        tokio::select! {
            served = self.serve(input, output) => served,
            _ = signal::ctrl_c() => {
                info!("Interrupted, shutting down bridge");
                Ok(())
            },
        }
    }

    /// Reads requests from `input` until end of stream and writes replies to `output`.
    /// Returns once every started request has been answered.
    ///
    /// # Errors
    /// Returns an error if reading `input` or writing `output` fails.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::channel::<Reply>(REPLY_QUEUE);

        let read = async move {
            let mut lines = input.lines();
            while let Some(line) = lines.next_line().await.context("Failed to read request")? {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_request(&line) {
                    Ok(request) => self.spawn_request(request, tx.clone()),
                    Err((id, err)) => {
                        warn!(error = %err, "Rejected malformed request");
                        if tx.send(Reply::failure(id, &err)).await.is_err() {
                            break;
                        }
                    },
                }
            }
            debug!("Request stream closed");
            anyhow::Ok(())
        };

        let write = async move {
            while let Some(reply) = rx.recv().await {
                let mut line = serde_json::to_vec(&reply).context("Failed to encode reply")?;
                line.push(b'\n');
                output.write_all(&line).await.context("Failed to write reply")?;
                output.flush().await.context("Failed to flush reply")?;
            }
            anyhow::Ok(())
        };

        let (read, write) = tokio::join!(read, write);
        read.and(write)
    }

    fn spawn_request(&self, request: Request, tx: mpsc::Sender<Reply>) {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let Request { id, command } = request;
            let name = command.name();
            let reply = match dispatcher.dispatch(command).await {
                Ok(value) => Reply::success(id, value),
                Err(err) => {
                    debug!(id, command = name, kind = err.reply_kind(), "Command failed");
                    Reply::failure(Some(id), &err)
                },
            };
            if tx.send(reply).await.is_err() {
                warn!(id, command = name, "Reply dropped, output closed");
            }
        });
    }
}
