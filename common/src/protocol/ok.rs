use serde_json::Value;

use super::{read_bool, read_string, write_string, Codec, Result};

/// relay -> client: `["OK", <event_id>, <accepted>, <message>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub event_id: String,
    pub accepted: bool,
    pub message: String,
}

impl Codec for CommandResult {
    fn decode(fields: &[Value]) -> Result<Self> {
        Ok(Self {
            event_id: read_string(fields, 0, "event id")?,
            accepted: read_bool(fields, 1, "accepted")?,
            message: read_string(fields, 2, "message")?,
        })
    }

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()> {
        write_string(buf, &self.event_id);
        buf.push(Value::Bool(self.accepted));
        write_string(buf, &self.message);
        Ok(())
    }
}
