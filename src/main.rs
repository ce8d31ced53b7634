use callhost::utils::{logger, validation::Validate};
use callhost::{CliConfig, ClassHosting};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌（寫到 stderr）
    logger::init_cli_logger(config.log_level(), config.json_logs());

    tracing::info!("Starting {}", config.host.name);
    tracing::debug!("Host config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let hosting = Arc::new(ClassHosting::from_settings(&config));

    if let Err(e) = hosting.serve_stdio().await {
        tracing::error!(
            "❌ Host stopped with error: {} (Severity: {:?})",
            e,
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        std::process::exit(2);
    }

    // tokio 的 stdin 讀取執行緒會卡住 runtime 關閉，直接結束行程
    std::process::exit(0);
}
