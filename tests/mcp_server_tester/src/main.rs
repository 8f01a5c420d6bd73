use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::{debug, info};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use unhcr_core::{Request, Response};

/// Drives a demographics MCP server over stdio and prints its answers
#[derive(Parser, Debug)]
#[command(name = "mcp_server_tester")]
struct Args {
    /// Server executable (default: unhcr-demographics-mcp next to this binary)
    #[arg(long)]
    server: Option<PathBuf>,

    /// Year to request demographics for
    #[arg(long, default_value_t = 2022)]
    year: i64,

    /// Country of origin filter (ISO3)
    #[arg(long)]
    coo: Option<String>,

    /// Country of asylum filter (ISO3)
    #[arg(long)]
    coa: Option<String>,
}

struct McpClient {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl McpClient {
    fn spawn(server: &Path) -> Result<Self> {
        let mut child = Command::new(server)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", server.display()))?;

        let stdin = child.stdin.take().ok_or_else(|| anyhow!("Child stdin missing"))?;
        let stdout = child.stdout.take().ok_or_else(|| anyhow!("Child stdout missing"))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    async fn send_request(&mut self, request: &Request) -> Result<Response> {
        let line = serde_json::to_string(request)?;
        debug!("-> {}", line);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let reply = self
            .stdout
            .next_line()
            .await?
            .ok_or_else(|| anyhow!("Server closed stdout before answering"))?;
        debug!("<- {}", reply);
        serde_json::from_str(&reply).with_context(|| format!("Unparseable response: {}", reply))
    }

    async fn close(mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }
}

fn default_server_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe.with_file_name(format!("unhcr-demographics-mcp{}", std::env::consts::EXE_SUFFIX)))
}

fn check_id(response: &Response, expected: i64) -> Result<()> {
    if response.id != json!(expected) {
        bail!("Response id {} does not match request id {}", response.id, expected);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("mcp_server_tester", log::LevelFilter::Debug)
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let server = match args.server {
        Some(path) => path,
        None => default_server_path()?,
    };

    info!("Starting {}", server.display());
    let mut client = McpClient::spawn(&server)?;

    let response = client.send_request(&Request::new(1, "listTools", None)).await?;
    check_id(&response, 1)?;
    println!("List Tools Response: {}", serde_json::to_string_pretty(&response)?);

    let mut arguments = json!({"year": args.year});
    if let Some(coo) = &args.coo {
        arguments["coo"] = Value::from(coo.as_str());
    }
    if let Some(coa) = &args.coa {
        arguments["coa"] = Value::from(coa.as_str());
    }
    let call = Request::new(
        2,
        "callTool",
        Some(json!({"name": "get_demographics", "arguments": arguments})),
    );
    let response = client.send_request(&call).await?;
    check_id(&response, 2)?;
    println!("Get Demographics Response: {}", serde_json::to_string_pretty(&response)?);

    client.close().await?;
    info!("Done");
    Ok(())
}
