use serde_json::Value;

use super::{read_string, write_string, Codec, Result};

/// relay -> client: end of stored events, `["EOSE", <sub_id>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eose {
    pub sub_id: String,
}

impl Codec for Eose {
    fn decode(fields: &[Value]) -> Result<Self> {
        Ok(Self {
            sub_id: read_string(fields, 0, "subscription id")?,
        })
    }

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()> {
        write_string(buf, &self.sub_id);
        Ok(())
    }
}
