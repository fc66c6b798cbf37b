use std::{collections::HashMap, sync::Arc, time::Duration};

use log::trace;
use parking_lot::Mutex;
use relay_common::protocol::{Filter, RelayMessage};
use tokio::{select, sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::fake::{generate_fake_event, generate_fake_stored_events};

/// Answers subscriptions with canned events.
///
/// Each subscription gets its stored events and EOSE right away, then exactly
/// one more event after `interval` to stand in for a live update. Subscriptions
/// are keyed by connection id, then subscription id; each one owns at most one
/// pending timer.
#[derive(Clone)]
pub struct FakeEventProvider {
    /// key = connection id, value = (key = subscription id, value = live event timer)
    subs: Arc<Mutex<HashMap<u64, HashMap<String, CancellationToken>>>>,
    interval: Duration,
    /// parent of every timer, cancelled when the relay shuts down
    token: CancellationToken,
}

impl FakeEventProvider {
    pub fn new(interval: Duration, token: CancellationToken) -> Self {
        Self {
            subs: Arc::new(Mutex::new(HashMap::new())),
            interval,
            token,
        }
    }

    /// Messages sent after the connection closed are dropped.
    pub fn start(
        &self,
        conn_id: u64,
        sub_id: &str,
        filters: &[Filter],
        sink: &mpsc::UnboundedSender<RelayMessage>,
    ) {
        let mut subs = self.subs.lock();
        let conn = subs.entry(conn_id).or_default();
        if let Some(timer) = conn.remove(sub_id) {
            trace!("provider::start: replace timer of subscription {sub_id} on connection {conn_id}");
            timer.cancel();
        }

        for message in generate_fake_stored_events(sub_id, filters) {
            sink.send(message).ok();
        }
        sink.send(RelayMessage::eose(sub_id)).ok();

        let timer = self.token.child_token();
        conn.insert(sub_id.to_string(), timer.clone());
        let sink = sink.clone();
        let sub_id = sub_id.to_string();
        let interval = self.interval;
        tokio::spawn(async move {
            select! {
                biased;
                _ = timer.cancelled() => {}
                _ = sleep(interval) => {
                    trace!("provider[spawn]: send live event of subscription {sub_id}");
                    sink.send(generate_fake_event(&sub_id)).ok();
                }
            }
        });
    }

    /// Stop one subscription, or every subscription of the connection when
    /// `sub_id` is `None`. Unknown ids are ignored.
    pub fn stop(&self, conn_id: u64, sub_id: Option<&str>) {
        let mut subs = self.subs.lock();
        match sub_id {
            Some(sub_id) => {
                let Some(conn) = subs.get_mut(&conn_id) else {
                    return;
                };
                if let Some(timer) = conn.remove(sub_id) {
                    trace!("provider::stop: stop subscription {sub_id} on connection {conn_id}");
                    timer.cancel();
                }
            }
            None => {
                let Some(conn) = subs.remove(&conn_id) else {
                    return;
                };
                trace!(
                    "provider::stop: stop {} subscriptions on connection {conn_id}",
                    conn.len()
                );
                for timer in conn.into_values() {
                    timer.cancel();
                }
            }
        }
    }

    /// registered subscriptions of one connection
    pub fn active(&self, conn_id: u64) -> usize {
        self.subs.lock().get(&conn_id).map_or(0, HashMap::len)
    }

    /// registered subscriptions across all connections
    pub fn len(&self) -> usize {
        self.subs.lock().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    fn limit(n: u64) -> Filter {
        Filter {
            limit: Some(n),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stored_events_then_eose_then_live_event() {
        let provider = FakeEventProvider::new(INTERVAL, CancellationToken::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        provider.start(1, "sub", &[limit(2), Filter::default()], &tx);

        assert_eq!(rx.try_recv().unwrap(), generate_fake_event("sub"));
        assert_eq!(rx.try_recv().unwrap(), generate_fake_event("sub"));
        assert_eq!(rx.try_recv().unwrap(), RelayMessage::eose("sub"));
        assert!(rx.try_recv().is_err());

        let live = timeout(INTERVAL * 2, rx.recv()).await.unwrap().unwrap();
        assert_eq!(live, generate_fake_event("sub"));
        assert_eq!(provider.active(1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_timer() {
        let provider = FakeEventProvider::new(INTERVAL, CancellationToken::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        provider.start(1, "sub", &[], &tx);
        provider.start(1, "sub", &[], &tx);
        assert_eq!(rx.try_recv().unwrap(), RelayMessage::eose("sub"));
        assert_eq!(rx.try_recv().unwrap(), RelayMessage::eose("sub"));

        sleep(INTERVAL * 3).await;
        assert_eq!(rx.try_recv().unwrap(), generate_fake_event("sub"));
        assert!(rx.try_recv().is_err());
        assert_eq!(provider.active(1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_one_subscription() {
        let provider = FakeEventProvider::new(INTERVAL, CancellationToken::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        provider.start(1, "a", &[], &tx);
        provider.start(1, "b", &[], &tx);
        provider.stop(1, Some("a"));
        assert_eq!(provider.active(1), 1);

        sleep(INTERVAL * 3).await;
        assert_eq!(rx.try_recv().unwrap(), RelayMessage::eose("a"));
        assert_eq!(rx.try_recv().unwrap(), RelayMessage::eose("b"));
        assert_eq!(rx.try_recv().unwrap(), generate_fake_event("b"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_connection_keeps_others() {
        let provider = FakeEventProvider::new(INTERVAL, CancellationToken::new());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        provider.start(1, "a", &[], &tx1);
        provider.start(1, "b", &[], &tx1);
        provider.start(2, "a", &[], &tx2);
        provider.stop(1, None);
        assert_eq!(provider.active(1), 0);
        assert_eq!(provider.len(), 1);

        sleep(INTERVAL * 3).await;
        rx1.try_recv().unwrap();
        rx1.try_recv().unwrap();
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), RelayMessage::eose("a"));
        assert_eq!(rx2.try_recv().unwrap(), generate_fake_event("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_timers() {
        let token = CancellationToken::new();
        let provider = FakeEventProvider::new(INTERVAL, token.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        provider.start(1, "sub", &[], &tx);
        token.cancel();

        sleep(INTERVAL * 3).await;
        assert_eq!(rx.try_recv().unwrap(), RelayMessage::eose("sub"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_ids_and_closed_sink() {
        let provider = FakeEventProvider::new(INTERVAL, CancellationToken::new());
        provider.stop(7, Some("missing"));
        provider.stop(7, None);

        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        provider.start(7, "sub", &[limit(3)], &tx);
        assert_eq!(provider.active(7), 1);
        provider.stop(7, None);
        assert!(provider.is_empty());
    }
}
