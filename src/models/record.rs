// Request log record and the envelopes it travels in

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Envelope type the live channel uses for a newly logged request.
pub const NEW_REQUEST_EVENT: &str = "new_request";

/// One logged request/response pair. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// RFC 3339. A timestamp without an offset is read as UTC.
    #[serde(deserialize_with = "timestamp_lenient")]
    pub timestamp: DateTime<FixedOffset>,
    pub method: String,
    pub url: String,
    pub client_ip: String,
    /// Any integer is kept as sent. Absent or null counts as a failed request.
    #[serde(default)]
    pub status_code: Option<i64>,
    pub response_time_ms: f64,
    /// Absent or null reads as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    /// Raw request payload, passed through untouched.
    #[serde(default)]
    pub body: Option<String>,
    /// Raw response payload, passed through untouched.
    #[serde(default)]
    pub response_body: Option<String>,
}

impl Record {
    /// Exactly 200 is success; anything else (including no status) is a failure.
    pub fn is_success(&self) -> bool {
        self.status_code == Some(200)
    }

    pub fn fingerprint(&self) -> RecordFingerprint {
        RecordFingerprint {
            timestamp: self.timestamp,
            method: self.method.clone(),
            url: self.url.clone(),
            client_ip: self.client_ip.clone(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn timestamp_lenient<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = raw.parse::<DateTime<FixedOffset>>() {
        return Ok(ts);
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| serde::de::Error::custom(format!("timestamp {:?}: {}", raw, e)))
}

/// Identity used by the optional duplicate guard. The wire format carries no id,
/// so a record is identified by when and from where it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordFingerprint {
    pub timestamp: DateTime<FixedOffset>,
    pub method: String,
    pub url: String,
    pub client_ip: String,
}

/// Bulk snapshot response: `{ "logs": [...] }`, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<Record>,
}

/// Live channel envelope. `data` stays raw until the type is known, so unknown
/// envelope types never fail on an unfamiliar payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub data: serde_json::Value,
}
