use super::{Result, StorageError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// On-disk wrapper carrying the schema version of a persisted record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub version: u32,
    pub data: T,
}

/// A value bound to one storage key with an explicit schema version.
///
/// Payloads written before envelopes existed are read as version 0. `migrate`
/// is called once per version step until the payload reaches [`Record::VERSION`].
pub trait Record: Serialize + DeserializeOwned + Default + Send + Sync {
    /// Storage key this record lives under
    const KEY: &'static str;

    /// Current schema version
    const VERSION: u32;

    /// Upgrade `data` from version `from` to `from + 1`
    fn migrate(from: u32, data: Value) -> std::result::Result<Value, String> {
        let _ = from;
        Ok(data)
    }
}

/// Split a stored JSON value into (version, payload)
fn unwrap_envelope(value: Value) -> (u32, Value) {
    if let Value::Object(map) = &value {
        if map.len() == 2 && map.contains_key("data") {
            if let Some(version) = map.get("version").and_then(Value::as_u64) {
                if let Ok(version) = u32::try_from(version) {
                    if let Value::Object(mut map) = value {
                        let data = map.remove("data").unwrap_or(Value::Null);
                        return (version, data);
                    }
                }
            }
        }
    }
    (0, value)
}

/// Parse `raw` and reject payloads written by a newer schema than `supported`
fn open_envelope(key: &str, raw: &str, supported: u32) -> Result<(u32, Value)> {
    let value: Value = serde_json::from_str(raw)?;
    let (version, data) = unwrap_envelope(value);
    if version > supported {
        return Err(StorageError::UnsupportedVersion {
            key: key.to_string(),
            found: version,
            supported,
        });
    }
    Ok((version, data))
}

pub(crate) fn decode<R: Record>(raw: &str) -> Result<R> {
    let (mut version, mut data) = open_envelope(R::KEY, raw, R::VERSION)?;

    while version < R::VERSION {
        data = R::migrate(version, data).map_err(|reason| StorageError::Migration {
            key: R::KEY.to_string(),
            from: version,
            reason,
        })?;
        version += 1;
    }

    Ok(serde_json::from_value(data)?)
}

pub(crate) fn encode<R: Record>(record: &R) -> Result<String> {
    encode_value(R::VERSION, record)
}

/// Decode a value kept under a dynamic key whose shape has no migrations.
///
/// Envelopes up to `supported` and bare legacy payloads are read as they are.
pub(crate) fn decode_value<T: DeserializeOwned>(key: &str, raw: &str, supported: u32) -> Result<T> {
    let (_, data) = open_envelope(key, raw, supported)?;
    Ok(serde_json::from_value(data)?)
}

pub(crate) fn encode_value<T: Serialize + ?Sized>(version: u32, value: &T) -> Result<String> {
    let envelope = Envelope {
        version,
        data: value,
    };
    Ok(serde_json::to_string(&envelope)?)
}
