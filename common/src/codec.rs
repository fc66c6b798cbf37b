use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Message is not a JSON array")]
    NotAnArray,
    #[error("Missing message type")]
    MissingType,
    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid field: {0}")]
    InvalidField(&'static str),
}

/// Every message body is the list of array elements after the type tag
pub trait Codec {
    fn decode(fields: &[Value]) -> Result<Self>
    where
        Self: Sized;

    fn encode(&self, buf: &mut Vec<Value>) -> Result<()>;
}

/// split `["TYPE", ...]` into its tag and the remaining elements
pub fn read_frame(text: &str) -> Result<(String, Vec<Value>)> {
    let Value::Array(mut items) = serde_json::from_str::<Value>(text)? else {
        return Err(Error::NotAnArray);
    };
    if items.is_empty() {
        return Err(Error::MissingType);
    }
    let Value::String(tag) = items.remove(0) else {
        return Err(Error::MissingType);
    };
    Ok((tag, items))
}

pub fn write_frame(tag: &str, body: Vec<Value>) -> Result<String> {
    let mut items = Vec::with_capacity(body.len() + 1);
    items.push(Value::String(tag.to_string()));
    items.extend(body);
    Ok(serde_json::to_string(&Value::Array(items))?)
}

pub fn read_string(fields: &[Value], index: usize, name: &'static str) -> Result<String> {
    match fields.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::InvalidField(name)),
        None => Err(Error::MissingField(name)),
    }
}

pub fn read_bool(fields: &[Value], index: usize, name: &'static str) -> Result<bool> {
    match fields.get(index) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(Error::InvalidField(name)),
        None => Err(Error::MissingField(name)),
    }
}

pub fn read_object<T: DeserializeOwned>(
    fields: &[Value],
    index: usize,
    name: &'static str,
) -> Result<T> {
    let value = fields.get(index).ok_or(Error::MissingField(name))?;
    T::deserialize(value).map_err(|_| Error::InvalidField(name))
}

pub fn write_string(buf: &mut Vec<Value>, s: &str) {
    buf.push(Value::String(s.to_string()))
}

pub fn write_object<T: Serialize>(buf: &mut Vec<Value>, object: &T) -> Result<()> {
    buf.push(serde_json::to_value(object)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn frame_split() {
        let (tag, fields) = read_frame(r#"["CLOSE","sub-1"]"#).unwrap();
        assert_eq!(tag, "CLOSE");
        assert_eq!(fields, vec![json!("sub-1")]);
    }

    #[test]
    fn frame_rejects_non_array() {
        assert!(matches!(read_frame(r#"{"a":1}"#), Err(Error::NotAnArray)));
        assert!(matches!(read_frame("[]"), Err(Error::MissingType)));
        assert!(matches!(read_frame("[1, 2]"), Err(Error::MissingType)));
        assert!(matches!(read_frame("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn frame_write() {
        let text = write_frame("EOSE", vec![json!("sub-1")]).unwrap();
        assert_eq!(text, r#"["EOSE","sub-1"]"#);
    }

    #[test]
    fn field_readers() {
        let fields = vec![json!("a"), json!(true), json!(3)];
        assert_eq!(read_string(&fields, 0, "s").unwrap(), "a");
        assert!(read_bool(&fields, 1, "b").unwrap());
        assert!(matches!(
            read_string(&fields, 2, "s"),
            Err(Error::InvalidField("s"))
        ));
        assert!(matches!(
            read_bool(&fields, 5, "b"),
            Err(Error::MissingField("b"))
        ));
        assert_eq!(read_object::<u64>(&fields, 2, "n").unwrap(), 3);
    }
}
