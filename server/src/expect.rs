use relay_common::protocol::ClientMessage;

use crate::relay::MockRelay;

/// Wait for the next message any client sent to `relay` and assert that it
/// equals `message`. Messages are compared decoded, so JSON key order does not
/// matter. Panics on mismatch or when nothing arrives within
/// `Config::expect_timeout`.
pub async fn expect_receive_message(relay: &mut MockRelay, message: &ClientMessage) {
    let wait = relay.config().expect_timeout;
    match relay.next_message(wait).await {
        Ok(received) => assert_eq!(
            &received, message,
            "mock relay received an unexpected message"
        ),
        Err(e) => panic!("expected mock relay to receive {message:?}: {e}"),
    }
}
