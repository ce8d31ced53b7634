pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::HostConfig;
pub use self::core::{
    client::ServiceClient,
    data_typed::DataTypedService,
    hosting::ClassHosting,
    proxy::{DataTypedProxy, SimultaneousProxy},
    simultaneous::SimultaneousService,
};
pub use utils::error::{HostError, Result};
