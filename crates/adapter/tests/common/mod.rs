use anyhow::Context as _;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

pub use restbridge_test_support::{StubServer, unreachable_base_url};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Env vars the binary reads; cleared before each spawn so the host environment can't leak in.
const CONFIG_VARS: &[&str] = &[
    "API_BASE_URL",
    "API_AUTH_TYPE",
    "API_AUTH_TOKEN",
    "API_BASIC_AUTH_USERNAME",
    "API_BASIC_AUTH_PASSWORD",
];

pub fn adapter_command(envs: &[(&str, &str)], args: &[&str]) -> Command {
    let bin = env!("CARGO_BIN_EXE_restbridge-mcp");
    let mut cmd = Command::new(bin);
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "warn")
        .envs(envs.iter().copied())
        .args(args)
        .kill_on_drop(true);
    cmd
}

/// Minimal MCP client speaking newline-delimited JSON-RPC to a spawned adapter over stdio.
///
/// Test-only; it knows just enough of the protocol to drive requests and match responses by id.
pub struct McpStdioSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl McpStdioSession {
    pub fn spawn(envs: &[(&str, &str)], args: &[&str]) -> anyhow::Result<Self> {
        let mut child = adapter_command(envs, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .context("spawn adapter")?;

        let stdin = child.stdin.take().context("adapter stdin")?;
        let stdout = child.stdout.take().context("adapter stdout")?;
        Ok(Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Spawn and complete the initialize handshake. Returns the initialize result.
    pub async fn connect(envs: &[(&str, &str)], args: &[&str]) -> anyhow::Result<(Self, Value)> {
        let mut session = Self::spawn(envs, args)?;
        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "restbridge-mcp-integration-tests", "version": "0" }
                }),
            )
            .await?;
        let result = init.get("result").cloned().context("initialize result")?;
        session
            .send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;
        Ok((session, result))
    }

    pub async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .context("write to adapter stdin")?;
        self.stdin.flush().await.context("flush adapter stdin")?;
        Ok(())
    }

    /// Send a request and wait for the response with the same id, skipping notifications.
    pub async fn request(&mut self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        tokio::time::timeout(RESPONSE_TIMEOUT, self.read_response(id))
            .await
            .with_context(|| format!("timed out waiting for {method} response"))?
    }

    async fn read_response(&mut self, id: u64) -> anyhow::Result<Value> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .context("read adapter stdout")?
                .context("adapter closed stdout")?;
            if line.trim().is_empty() {
                continue;
            }
            let msg: Value = serde_json::from_str(&line)
                .with_context(|| format!("non-JSON line on stdout: {line}"))?;
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
    }

    /// `tools/call` and parse the envelope out of the first text content item.
    pub async fn call_tool(
        &mut self,
        id: u64,
        name: &str,
        arguments: Value,
    ) -> anyhow::Result<(bool, Value)> {
        let msg = self
            .request(id, "tools/call", json!({"name": name, "arguments": arguments}))
            .await?;
        let result = msg.get("result").context("tools/call result")?;
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let text = result
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .context("tools/call missing text content")?;
        Ok((is_error, serde_json::from_str(text)?))
    }

    pub async fn resource_uris(&mut self, id: u64) -> anyhow::Result<Vec<String>> {
        let msg = self.request(id, "resources/list", json!({})).await?;
        let resources = msg
            .pointer("/result/resources")
            .and_then(Value::as_array)
            .context("resources/list result")?;
        Ok(resources
            .iter()
            .filter_map(|r| r.get("uri").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}
