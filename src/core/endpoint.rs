use crate::core::{ArrayValues, DataTyped, SimpleValues, Simultaneous};
use crate::utils::error::{HostError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    pub arity: usize,
}

const fn spec(name: &'static str, arity: usize) -> MethodSpec {
    MethodSpec { name, arity }
}

const DATA_TYPED_NAMES: &[&str] = &["IDataTyped", "DataTyped"];
const DATA_TYPED_METHODS: &[MethodSpec] = &[
    spec("ToSimpleText", 9),
    spec("ToArrayText", 9),
    spec("GetLineCount", 1),
    spec("GetFileSize", 1),
    spec("AllocateBytes", 2),
    spec("GetUnique", 2),
    spec("GetDouble", 1),
    spec("GetSystemVariables", 3),
];

const SIMULTANEOUS_NAMES: &[&str] = &["ISimultaneous", "Simultaneous"];
const SIMULTANEOUS_METHODS: &[MethodSpec] = &[
    spec("GetId", 0),
    spec("LoadIt", 1),
    spec("RemoveIt", 0),
];

/// A contract exposed to remote callers.
///
/// `invoke` receives the canonical method name from `methods()` and arguments
/// whose count already matches its arity.
#[async_trait]
pub trait ServiceEndpoint: Send + Sync {
    /// Contract names this endpoint answers to. The first one is reported in errors.
    fn names(&self) -> &[&'static str];

    fn methods(&self) -> &[MethodSpec];

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value>;

    async fn close(&self) -> Result<()>;
}

fn arg<T: DeserializeOwned>(method: &str, args: &[Value], index: usize) -> Result<T> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| HostError::invalid_argument(method, format!("argument {}: {}", index, e)))
}

fn encode<T: serde::Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn datetime_arg(method: &str, args: &[Value], index: usize) -> Result<NaiveDateTime> {
    let raw: String = arg(method, args, index)?;
    if let Ok(dts) = raw.parse::<NaiveDateTime>() {
        return Ok(dts);
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dts| dts.naive_local())
        .map_err(|e| HostError::invalid_argument(method, format!("argument {}: {}", index, e)))
}

/// Durations arrive either as fractional seconds or as `{"secs", "nanos"}`.
fn duration_arg(method: &str, args: &[Value], index: usize) -> Result<Duration> {
    match args.get(index) {
        Some(Value::Number(n)) => {
            let secs = n.as_f64().unwrap_or(-1.0);
            Duration::try_from_secs_f64(secs).map_err(|e| {
                HostError::invalid_argument(method, format!("argument {}: {}", index, e))
            })
        }
        _ => arg(method, args, index),
    }
}

pub struct DataTypedEndpoint<T: DataTyped> {
    inner: T,
    max_allocation_bytes: usize,
}

impl<T: DataTyped> DataTypedEndpoint<T> {
    pub fn new(inner: T, max_allocation_bytes: usize) -> Self {
        Self {
            inner,
            max_allocation_bytes,
        }
    }

    fn simple_values(method: &str, args: &[Value]) -> Result<SimpleValues> {
        Ok(SimpleValues {
            y: arg(method, args, 0)?,
            s: arg(method, args, 1)?,
            i: arg(method, args, 2)?,
            l: arg(method, args, 3)?,
            f: arg(method, args, 4)?,
            d: arg(method, args, 5)?,
            b: arg(method, args, 6)?,
            c: arg(method, args, 7)?,
            t: arg(method, args, 8)?,
        })
    }

    fn array_values(method: &str, args: &[Value]) -> Result<ArrayValues> {
        Ok(ArrayValues {
            y: arg(method, args, 0)?,
            s: arg(method, args, 1)?,
            i: arg(method, args, 2)?,
            l: arg(method, args, 3)?,
            f: arg(method, args, 4)?,
            d: arg(method, args, 5)?,
            b: arg(method, args, 6)?,
            c: arg(method, args, 7)?,
            t: arg(method, args, 8)?,
        })
    }
}

#[async_trait]
impl<T: DataTyped> ServiceEndpoint for DataTypedEndpoint<T> {
    fn names(&self) -> &[&'static str] {
        DATA_TYPED_NAMES
    }

    fn methods(&self) -> &[MethodSpec] {
        DATA_TYPED_METHODS
    }

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        match method {
            "ToSimpleText" => {
                let values = Self::simple_values(method, &args)?;
                encode(self.inner.to_simple_text(&values))
            }
            "ToArrayText" => {
                let values = Self::array_values(method, &args)?;
                encode(self.inner.to_array_text(&values))
            }
            "GetLineCount" => {
                let lines: Vec<String> = arg(method, &args, 0)?;
                encode(self.inner.get_line_count(&lines))
            }
            "GetFileSize" => {
                let path: PathBuf = arg(method, &args, 0)?;
                encode(self.inner.get_file_size(&path)?)
            }
            "AllocateBytes" => {
                let size: i64 = arg(method, &args, 0)?;
                let value: u8 = arg(method, &args, 1)?;
                let size = usize::try_from(size)
                    .map_err(|_| HostError::invalid_argument(method, "size cannot be negative"))?;
                if size > self.max_allocation_bytes {
                    return Err(HostError::invalid_argument(
                        method,
                        format!(
                            "size {} exceeds limit of {} bytes",
                            size, self.max_allocation_bytes
                        ),
                    ));
                }
                encode(self.inner.allocate_bytes(size, value))
            }
            "GetUnique" => {
                let lines: Vec<String> = arg(method, &args, 0)?;
                let with_trim: bool = arg(method, &args, 1)?;
                encode(self.inner.get_unique(&lines, with_trim))
            }
            "GetDouble" => {
                let lines: BTreeSet<String> = arg(method, &args, 0)?;
                encode(self.inner.get_double(&lines))
            }
            "GetSystemVariables" => {
                let dts = datetime_arg(method, &args, 0)?;
                let dur = duration_arg(method, &args, 1)?;
                let parent: Option<BTreeMap<String, i32>> = arg(method, &args, 2)?;
                encode(
                    self.inner
                        .get_system_variables(dts, dur, &parent.unwrap_or_default()),
                )
            }
            other => Err(HostError::MethodNotFound {
                method: other.to_string(),
            }),
        }
    }

    async fn close(&self) -> Result<()> {
        self.inner.close();
        Ok(())
    }
}

pub struct SimultaneousEndpoint<T: Simultaneous> {
    inner: T,
}

impl<T: Simultaneous> SimultaneousEndpoint<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Simultaneous> ServiceEndpoint for SimultaneousEndpoint<T> {
    fn names(&self) -> &[&'static str] {
        SIMULTANEOUS_NAMES
    }

    fn methods(&self) -> &[MethodSpec] {
        SIMULTANEOUS_METHODS
    }

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        match method {
            "GetId" => encode(self.inner.get_id().await?),
            "LoadIt" => {
                let word: String = arg(method, &args, 0)?;
                self.inner.load_it(word).await?;
                Ok(Value::Null)
            }
            "RemoveIt" => encode(self.inner.remove_it().await?),
            other => Err(HostError::MethodNotFound {
                method: other.to_string(),
            }),
        }
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
