pub mod client;
pub mod codec;
pub mod data_typed;
pub mod endpoint;
pub mod hosting;
pub mod proxy;
pub mod simultaneous;

pub use crate::domain::model::{ArrayValues, MethodCall, MethodResult, MethodStatus, SimpleValues};
pub use crate::domain::ports::{DataTyped, HostSettings, Simultaneous};
pub use crate::utils::error::Result;
