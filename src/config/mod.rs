#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "callhost")]
#[command(about = "Hosts the IDataTyped and ISimultaneous contracts over stdio")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Write logs as JSON")]
    pub json_logs: bool,

    /// Override services.work_delay_ms
    #[arg(long)]
    pub work_delay_ms: Option<u64>,

    #[arg(long)]
    pub disable_data_typed: bool,

    #[arg(long)]
    pub disable_simultaneous: bool,
}
