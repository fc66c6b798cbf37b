use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

/// delay between EOSE and the single simulated live event of a subscription
pub const FAKE_EVENTS_INTERVAL: Duration = Duration::from_millis(100);

/// default wait of `expect_receive_message`
pub const EXPECT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    /// port 0 picks a free port, see `MockRelay::local_addr`
    pub addr: SocketAddr,
    pub event_interval: Duration,
    pub expect_timeout: Duration,
}

impl Config {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Default::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            event_interval: FAKE_EVENTS_INTERVAL,
            expect_timeout: EXPECT_TIMEOUT,
        }
    }
}
