use serde_json::Value;

use super::{read_string, write_string, Codec, Result};

/// relay -> client: `["NOTICE", <message>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Codec for Notice {
    fn decode(fields: &[Value]) -> Result<Self> {
        Ok(Self {
            message: read_string(fields, 0, "message")?,
        })
    }

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()> {
        write_string(buf, &self.message);
        Ok(())
    }
}
