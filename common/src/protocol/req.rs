use serde_json::Value;

use super::{read_object, read_string, write_object, write_string, Codec, Filter, Result};

/// client -> relay: `["REQ", <sub_id>, <filter>...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Req {
    /// subscription id, unique within one connection
    pub sub_id: String,
    pub filters: Vec<Filter>,
}

impl Codec for Req {
    fn decode(fields: &[Value]) -> Result<Self> {
        let sub_id = read_string(fields, 0, "subscription id")?;
        let filters = (1..fields.len())
            .map(|i| read_object(fields, i, "filter"))
            .collect::<Result<Vec<Filter>>>()?;
        Ok(Self { sub_id, filters })
    }

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()> {
        write_string(buf, &self.sub_id);
        for filter in &self.filters {
            write_object(buf, filter)?;
        }
        Ok(())
    }
}
