mod close;
mod closed;
mod eose;
mod event;
mod filter;
mod notice;
mod ok;
mod req;

pub use self::{
    close::Close,
    closed::Closed,
    eose::Eose,
    event::{Event, Publish, SubscriptionEvent},
    filter::Filter,
    notice::Notice,
    ok::CommandResult,
    req::Req,
};
pub use crate::codec::{Codec, Error, Result};

use crate::codec::{
    read_bool, read_frame, read_object, read_string, write_frame, write_object, write_string,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Event,
    Req,
    Close,
    Eose,
    Notice,
    Ok,
    Closed,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Event => "EVENT",
            MessageType::Req => "REQ",
            MessageType::Close => "CLOSE",
            MessageType::Eose => "EOSE",
            MessageType::Notice => "NOTICE",
            MessageType::Ok => "OK",
            MessageType::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for MessageType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Ok(match value {
            "EVENT" => MessageType::Event,
            "REQ" => MessageType::Req,
            "CLOSE" => MessageType::Close,
            "EOSE" => MessageType::Eose,
            "NOTICE" => MessageType::Notice,
            "OK" => MessageType::Ok,
            "CLOSED" => MessageType::Closed,
            _ => return Err(Error::UnsupportedType(value.to_string())),
        })
    }
}

/// Messages sent from a client to the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Publish(Publish),
    Req(Req),
    Close(Close),
}

impl ClientMessage {
    pub fn req(sub_id: &str, filters: Vec<Filter>) -> Self {
        Self::Req(Req {
            sub_id: sub_id.to_string(),
            filters,
        })
    }

    pub fn close(sub_id: &str) -> Self {
        Self::Close(Close {
            sub_id: sub_id.to_string(),
        })
    }

    pub fn decode(text: &str) -> Result<Self> {
        let (tag, fields) = read_frame(text)?;
        Ok(match MessageType::try_from(tag.as_str())? {
            MessageType::Event => Self::Publish(Publish::decode(&fields)?),
            MessageType::Req => Self::Req(Req::decode(&fields)?),
            MessageType::Close => Self::Close(Close::decode(&fields)?),
            t => return Err(Error::UnsupportedType(t.to_string())),
        })
    }

    pub fn encode(&self) -> Result<String> {
        let mut body = Vec::new();
        match self {
            Self::Publish(p) => p.encode(&mut body)?,
            Self::Req(p) => p.encode(&mut body)?,
            Self::Close(p) => p.encode(&mut body)?,
        }
        write_frame(self.message_type().as_str(), body)
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Publish(_) => MessageType::Event,
            Self::Req(_) => MessageType::Req,
            Self::Close(_) => MessageType::Close,
        }
    }
}

/// Messages sent from the relay to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Event(SubscriptionEvent),
    Eose(Eose),
    Notice(Notice),
    Ok(CommandResult),
    Closed(Closed),
}

impl RelayMessage {
    pub fn event(sub_id: &str, event: Event) -> Self {
        Self::Event(SubscriptionEvent {
            sub_id: sub_id.to_string(),
            event,
        })
    }

    pub fn eose(sub_id: &str) -> Self {
        Self::Eose(Eose {
            sub_id: sub_id.to_string(),
        })
    }

    pub fn notice(message: &str) -> Self {
        Self::Notice(Notice {
            message: message.to_string(),
        })
    }

    pub fn decode(text: &str) -> Result<Self> {
        let (tag, fields) = read_frame(text)?;
        Ok(match MessageType::try_from(tag.as_str())? {
            MessageType::Event => Self::Event(SubscriptionEvent::decode(&fields)?),
            MessageType::Eose => Self::Eose(Eose::decode(&fields)?),
            MessageType::Notice => Self::Notice(Notice::decode(&fields)?),
            MessageType::Ok => Self::Ok(CommandResult::decode(&fields)?),
            MessageType::Closed => Self::Closed(Closed::decode(&fields)?),
            t => return Err(Error::UnsupportedType(t.to_string())),
        })
    }

    pub fn encode(&self) -> Result<String> {
        let mut body = Vec::new();
        match self {
            Self::Event(p) => p.encode(&mut body)?,
            Self::Eose(p) => p.encode(&mut body)?,
            Self::Notice(p) => p.encode(&mut body)?,
            Self::Ok(p) => p.encode(&mut body)?,
            Self::Closed(p) => p.encode(&mut body)?,
        }
        write_frame(self.message_type().as_str(), body)
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Event(_) => MessageType::Event,
            Self::Eose(_) => MessageType::Eose,
            Self::Notice(_) => MessageType::Notice,
            Self::Ok(_) => MessageType::Ok,
            Self::Closed(_) => MessageType::Closed,
        }
    }
}
