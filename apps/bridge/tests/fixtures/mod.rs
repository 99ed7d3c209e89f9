use serde_json::Value;
use svault::domain::config::VaultConfig;
use svault_bridge::{Bridge, FixedPrompt, PromptMode};
use tempfile::TempDir;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::task::JoinHandle;

/// Host-side end of a bridge served over an in-memory pipe.
#[allow(dead_code)]
pub struct Client {
    requests: WriteHalf<DuplexStream>,
    replies: Lines<BufReader<ReadHalf<DuplexStream>>>,
    server: JoinHandle<anyhow::Result<()>>,
    next_id: u64,
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Client {
    /// Sends `command` with a fresh id and waits for its reply.
    /// # Panics
    /// * If the bridge closes the stream or answers another id.
    pub async fn call(&mut self, mut command: Value) -> Value {
        self.next_id += 1;
        command["id"] = self.next_id.into();
        self.send_raw(&command.to_string()).await;
        let reply = self.recv().await;
        assert_eq!(reply["id"], self.next_id, "{reply}");
        reply
    }

    pub async fn send_raw(&mut self, line: &str) {
        self.requests.write_all(line.as_bytes()).await.expect("write request");
        self.requests.write_all(b"\n").await.expect("write newline");
    }

    pub async fn recv(&mut self) -> Value {
        let line = self.replies.next_line().await.expect("read reply").expect("reply line");
        serde_json::from_str(&line).expect("reply is JSON")
    }

    /// Closes the request stream and waits for the bridge to finish.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.requests.shutdown().await.expect("shutdown");
        drop(self.requests);
        self.server.await.expect("bridge task")
    }
}

/// Bridge over a scratch directory and the software element.
/// # Panics
/// * If the vault cannot be opened.
pub async fn connect(mode: PromptMode) -> Client {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut cfg = VaultConfig::default();
    cfg.storage.data_dir = dir.path().to_path_buf();

    let bridge = Bridge::builder()
        .config(cfg)
        .prompt(FixedPrompt::new(mode).with_password("app password"))
        .build()
        .await
        .expect("bridge");

    let (host, guest) = tokio::io::duplex(64 * 1024);
    let (guest_read, guest_write) = tokio::io::split(guest);
    let server =
        tokio::spawn(async move { bridge.serve(BufReader::new(guest_read), guest_write).await });

    let (host_read, host_write) = tokio::io::split(host);
    Client {
        requests: host_write,
        replies: BufReader::new(host_read).lines(),
        server,
        next_id: 0,
        dir,
    }
}
