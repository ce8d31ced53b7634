use crate::domain::model::{ArrayValues, SimpleValues};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

/// Typed conversions and small collection helpers.
pub trait DataTyped: Send + Sync {
    fn to_simple_text(&self, values: &SimpleValues) -> String;

    fn to_array_text(&self, values: &ArrayValues) -> String;

    fn get_line_count(&self, lines: &[String]) -> usize;

    fn get_file_size(&self, path: &Path) -> Result<u64>;

    fn allocate_bytes(&self, size: usize, value: u8) -> Vec<u8>;

    fn get_unique(&self, lines: &[String], with_trim: bool) -> BTreeSet<String>;

    fn get_double(&self, lines: &BTreeSet<String>) -> Vec<String>;

    fn get_system_variables(
        &self,
        dts: NaiveDateTime,
        dur: Duration,
        parent: &BTreeMap<String, i32>,
    ) -> BTreeMap<String, i32>;

    /// Released once by the host on shutdown.
    fn close(&self) {}
}

/// Deferred operations over shared state.
#[async_trait]
pub trait Simultaneous: Send + Sync {
    async fn get_id(&self) -> Result<i32>;

    async fn load_it(&self, word: String) -> Result<()>;

    async fn remove_it(&self) -> Result<Option<String>>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

pub trait HostSettings: Send + Sync {
    fn max_message_bytes(&self) -> usize;
    fn max_allocation_bytes(&self) -> usize;
    fn work_delay(&self) -> Duration;
    fn data_typed_enabled(&self) -> bool;
    fn simultaneous_enabled(&self) -> bool;
}
