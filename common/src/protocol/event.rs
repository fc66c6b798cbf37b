use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{read_object, read_string, write_object, write_string, Codec, Result};

/// A signed note as it travels on the wire. Signatures are not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    /// unix timestamp in seconds
    pub created_at: i64,
    pub kind: u32,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

/// client -> relay: `["EVENT", <event>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub event: Event,
}

impl Codec for Publish {
    fn decode(fields: &[Value]) -> Result<Self> {
        Ok(Self {
            event: read_object(fields, 0, "event")?,
        })
    }

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()> {
        write_object(buf, &self.event)
    }
}

/// relay -> client: `["EVENT", <sub_id>, <event>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionEvent {
    pub sub_id: String,
    pub event: Event,
}

impl Codec for SubscriptionEvent {
    fn decode(fields: &[Value]) -> Result<Self> {
        Ok(Self {
            sub_id: read_string(fields, 0, "subscription id")?,
            event: read_object(fields, 1, "event")?,
        })
    }

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()> {
        write_string(buf, &self.sub_id);
        write_object(buf, &self.event)
    }
}
