mod client;
mod config;
mod expect;
mod fake;
mod provider;
mod relay;
mod server;

/// export relay-common crate
pub use relay_common as common;

pub use config::Config;
pub use expect::expect_receive_message;
pub use fake::{generate_fake_event, generate_fake_stored_events};
pub use provider::FakeEventProvider;
pub use relay::{Error, MockRelay};
