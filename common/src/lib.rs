pub mod codec;
pub mod helper;
pub mod protocol;
