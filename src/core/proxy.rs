use crate::core::client::ServiceClient;
use crate::core::{ArrayValues, SimpleValues, Simultaneous};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DATA_TYPED: &str = "IDataTyped";
const SIMULTANEOUS: &str = "ISimultaneous";

fn to_arg<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Remote `IDataTyped`. Every call is a round trip, so the methods are async.
#[derive(Clone)]
pub struct DataTypedProxy {
    client: Arc<ServiceClient>,
}

impl DataTypedProxy {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }

    pub async fn to_simple_text(&self, v: &SimpleValues) -> Result<String> {
        let args = vec![
            to_arg(v.y)?,
            to_arg(v.s)?,
            to_arg(v.i)?,
            to_arg(v.l)?,
            to_arg(v.f)?,
            to_arg(v.d)?,
            to_arg(v.b)?,
            to_arg(v.c)?,
            to_arg(&v.t)?,
        ];
        self.client.call(DATA_TYPED, "ToSimpleText", args).await
    }

    pub async fn to_array_text(&self, v: &ArrayValues) -> Result<String> {
        let args = vec![
            to_arg(&v.y)?,
            to_arg(&v.s)?,
            to_arg(&v.i)?,
            to_arg(&v.l)?,
            to_arg(&v.f)?,
            to_arg(&v.d)?,
            to_arg(&v.b)?,
            to_arg(&v.c)?,
            to_arg(&v.t)?,
        ];
        self.client.call(DATA_TYPED, "ToArrayText", args).await
    }

    pub async fn get_line_count(&self, lines: &[String]) -> Result<usize> {
        self.client
            .call(DATA_TYPED, "GetLineCount", vec![to_arg(lines)?])
            .await
    }

    pub async fn get_file_size(&self, path: &Path) -> Result<u64> {
        self.client
            .call(DATA_TYPED, "GetFileSize", vec![to_arg(path)?])
            .await
    }

    pub async fn allocate_bytes(&self, size: usize, value: u8) -> Result<Vec<u8>> {
        self.client
            .call(
                DATA_TYPED,
                "AllocateBytes",
                vec![to_arg(size)?, to_arg(value)?],
            )
            .await
    }

    pub async fn get_unique(&self, lines: &[String], with_trim: bool) -> Result<BTreeSet<String>> {
        self.client
            .call(
                DATA_TYPED,
                "GetUnique",
                vec![to_arg(lines)?, to_arg(with_trim)?],
            )
            .await
    }

    pub async fn get_double(&self, lines: &BTreeSet<String>) -> Result<Vec<String>> {
        self.client
            .call(DATA_TYPED, "GetDouble", vec![to_arg(lines)?])
            .await
    }

    pub async fn get_system_variables(
        &self,
        dts: NaiveDateTime,
        dur: Duration,
        parent: &BTreeMap<String, i32>,
    ) -> Result<BTreeMap<String, i32>> {
        self.client
            .call(
                DATA_TYPED,
                "GetSystemVariables",
                vec![to_arg(dts)?, to_arg(dur)?, to_arg(parent)?],
            )
            .await
    }
}

/// Remote `ISimultaneous`, interchangeable with a local implementation.
#[derive(Clone)]
pub struct SimultaneousProxy {
    client: Arc<ServiceClient>,
}

impl SimultaneousProxy {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Simultaneous for SimultaneousProxy {
    async fn get_id(&self) -> Result<i32> {
        self.client.call(SIMULTANEOUS, "GetId", Vec::new()).await
    }

    async fn load_it(&self, word: String) -> Result<()> {
        self.client
            .call(SIMULTANEOUS, "LoadIt", vec![Value::String(word)])
            .await
    }

    async fn remove_it(&self) -> Result<Option<String>> {
        self.client.call(SIMULTANEOUS, "RemoveIt", Vec::new()).await
    }

    async fn close(&self) -> Result<()> {
        self.client.close().await
    }
}
