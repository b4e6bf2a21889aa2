//! Tagged result envelope
//!
//! `{ "success": true, "value": ... }` or `{ "success": false, "error": 109 }`.
//! A successful envelope always carries `value`, even when it is `null`.

use crate::ledger::{LedgerError, LedgerResult};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<T> {
    Ok(T),
    Err(LedgerError),
}

#[derive(Serialize)]
struct WireOut<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<LedgerError>,
}

#[derive(Deserialize)]
struct WireIn {
    success: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<LedgerError>,
}

impl<T> Response<T> {
    pub fn ok(value: T) -> Self {
        Response::Ok(value)
    }

    pub fn err(error: LedgerError) -> Self {
        Response::Err(error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Response::Ok(value) => Some(value),
            Response::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<LedgerError> {
        match self {
            Response::Ok(_) => None,
            Response::Err(error) => Some(*error),
        }
    }

    /// Map the success value, keeping errors as they are
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        match self {
            Response::Ok(value) => Response::Ok(f(value)),
            Response::Err(error) => Response::Err(error),
        }
    }

    /// Back to a `Result`
    pub fn into_result(self) -> LedgerResult<T> {
        match self {
            Response::Ok(value) => Ok(value),
            Response::Err(error) => Err(error),
        }
    }
}

impl<T> From<LedgerResult<T>> for Response<T> {
    fn from(result: LedgerResult<T>) -> Self {
        match result {
            Ok(value) => Response::Ok(value),
            Err(error) => Response::Err(error),
        }
    }
}

impl<T: Serialize> Serialize for Response<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Response::Ok(value) => WireOut {
                success: true,
                value: Some(value),
                error: None,
            },
            Response::Err(error) => WireOut {
                success: false,
                value: None,
                error: Some(*error),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de, T: de::DeserializeOwned> Deserialize<'de> for Response<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireIn::deserialize(deserializer)?;
        match (wire.success, wire.error) {
            // A missing value reads as null, so `Option<T>` payloads become `None`
            (true, None) => T::deserialize(wire.value)
                .map(Response::Ok)
                .map_err(de::Error::custom),
            (true, Some(error)) => Err(de::Error::custom(format!(
                "successful response carries error {}",
                error.code()
            ))),
            (false, Some(error)) => Ok(Response::Err(error)),
            (false, None) => Err(de::Error::custom("failed response without an error code")),
        }
    }
}
