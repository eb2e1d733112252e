use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire field carrying the publish-time stamp, merged into the same JSON
/// object as the payload fields.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// One navigation/animation instruction: the publisher's open key-value
/// payload plus the wall-clock stamp assigned at publish time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollyCommand {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

impl ScrollyCommand {
    /// A publisher-supplied `timestamp` key is dropped so the stamp is the
    /// only value serialized under [`TIMESTAMP_FIELD`].
    pub(crate) fn stamp_now(mut fields: Map<String, Value>) -> Self {
        fields.remove(TIMESTAMP_FIELD);
        Self {
            fields,
            timestamp_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The conventional `type` field, when the payload carries one.
    pub fn kind(&self) -> Option<&str> {
        self.field("type").and_then(Value::as_str)
    }
}
