use serde_json::Value;

use super::{read_string, write_string, Codec, Result};

/// relay -> client: subscription ended by the relay, `["CLOSED", <sub_id>, <message>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    pub sub_id: String,
    pub message: String,
}

impl Codec for Closed {
    fn decode(fields: &[Value]) -> Result<Self> {
        Ok(Self {
            sub_id: read_string(fields, 0, "subscription id")?,
            message: read_string(fields, 1, "message")?,
        })
    }

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()> {
        write_string(buf, &self.sub_id);
        write_string(buf, &self.message);
        Ok(())
    }
}
