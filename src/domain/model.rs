use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar arguments of `ToSimpleText`, in wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleValues {
    pub y: i8,
    pub s: i16,
    pub i: i32,
    pub l: i64,
    pub f: f32,
    pub d: f64,
    pub b: bool,
    pub c: char,
    pub t: String,
}

/// Array arguments of `ToArrayText`, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValues {
    pub y: Vec<u8>,
    pub s: Vec<i16>,
    pub i: Vec<i32>,
    pub l: Vec<i64>,
    pub f: Vec<f32>,
    pub d: Vec<f64>,
    pub b: Vec<bool>,
    pub c: Vec<char>,
    pub t: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub enum MethodStatus {
    Unknown,
    Ok,
    ClassNotFound,
    MethodNotFound,
    MethodFailed,
}

impl MethodStatus {
    pub fn code(&self) -> u16 {
        match self {
            MethodStatus::Unknown => 0,
            MethodStatus::Ok => 200,
            MethodStatus::ClassNotFound => 404,
            MethodStatus::MethodNotFound => 406,
            MethodStatus::MethodFailed => 500,
        }
    }
}

impl From<u16> for MethodStatus {
    fn from(code: u16) -> Self {
        match code {
            200 => MethodStatus::Ok,
            404 => MethodStatus::ClassNotFound,
            406 => MethodStatus::MethodNotFound,
            500 => MethodStatus::MethodFailed,
            _ => MethodStatus::Unknown,
        }
    }
}

// 超出 u16 範圍的數字（負數等）一律視為 Unknown
impl From<i64> for MethodStatus {
    fn from(code: i64) -> Self {
        u16::try_from(code).map_or(MethodStatus::Unknown, MethodStatus::from)
    }
}

impl From<MethodStatus> for u16 {
    fn from(status: MethodStatus) -> Self {
        status.code()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub id: u32,
    pub class: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResult {
    pub id: u32,
    pub status: MethodStatus,
    #[serde(default)]
    pub result: Value,
}

impl MethodResult {
    pub fn ok(id: u32, result: Value) -> Self {
        Self {
            id,
            status: MethodStatus::Ok,
            result,
        }
    }

    pub fn failed(id: u32, status: MethodStatus, message: impl Into<String>) -> Self {
        Self {
            id,
            status,
            result: Value::String(message.into()),
        }
    }
}
