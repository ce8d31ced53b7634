use anyhow::Context;
use callhost::utils::logger;
use callhost::ServiceClient;
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;

/// 啟動 host 並呼叫單一方法，用於手動測試
#[derive(Parser)]
#[command(name = "call_probe")]
#[command(about = "Spawns a callhost binary and invokes one method")]
struct Args {
    /// Path to the host executable
    #[arg(long)]
    host: PathBuf,

    /// Contract name, e.g. IDataTyped
    #[arg(long)]
    class: String,

    /// Method name, e.g. GetLineCount
    #[arg(long)]
    method: String,

    /// Arguments as a JSON array
    #[arg(long, default_value = "[]")]
    args: String,

    /// Extra arguments passed to the host
    #[arg(last = true)]
    host_args: Vec<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(if args.verbose { "debug" } else { "info" }, false);

    let call_args: Vec<Value> =
        serde_json::from_str(&args.args).context("--args must be a JSON array")?;

    let client = ServiceClient::spawn(&args.host, &args.host_args)
        .with_context(|| format!("failed to start {}", args.host.display()))?;

    let outcome = client
        .call::<Value>(&args.class, &args.method, call_args)
        .await;
    client.close().await?;

    let result = outcome.with_context(|| format!("{}::{} failed", args.class, args.method))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
