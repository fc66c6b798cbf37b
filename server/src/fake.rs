use relay_common::protocol::{Event, Filter, RelayMessage};

/// 2000-01-01T00:00:00Z in unix seconds
const FAKE_CREATED_AT: i64 = 946_684_800;

/// The same placeholder event every time, whatever the subscription asked for.
pub fn generate_fake_event(sub_id: &str) -> RelayMessage {
    let event = Event {
        id: "*".to_string(),
        content: "*".to_string(),
        created_at: FAKE_CREATED_AT,
        kind: 0,
        pubkey: "*".to_string(),
        sig: "*".to_string(),
        tags: vec![],
    };
    RelayMessage::event(sub_id, event)
}

/// `limit` fake events per filter, in filter order. A filter without a limit
/// (or with `limit: 0`) yields nothing.
pub fn generate_fake_stored_events(sub_id: &str, filters: &[Filter]) -> Vec<RelayMessage> {
    filters
        .iter()
        .flat_map(|filter| {
            (0..filter.limit.unwrap_or(0)).map(move |_| generate_fake_event(sub_id))
        })
        .collect()
}
