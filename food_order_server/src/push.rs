//! Server-Sent Events push channel.
//!
//! Each subscriber gets one long-lived response. The first frame is a `snapshot` of the subscriber's active orders,
//! followed by every [`SyncEvent`] the fan-out addresses to them, with `heartbeat` frames in between when things are
//! quiet. The stream ends if the subscriber falls too far behind the broadcast channel; clients treat that like any
//! other dropped connection and fall back to polling.
use std::time::Duration;

use actix_web::web::Bytes;
use food_order_engine::{
    db_types::Order,
    notifications::{PushMessage, SyncEvent},
};
use futures::{stream, Stream};
use log::*;
use tokio::{
    sync::broadcast::{error::RecvError, Receiver},
    time::{interval_at, Instant, Interval},
};

use crate::errors::ServerError;

/// Renders an event as one SSE frame.
pub fn sse_frame(event: &SyncEvent) -> Result<Bytes, ServerError> {
    let data = serde_json::to_string(event).map_err(|e| ServerError::SerializationError(e.to_string()))?;
    Ok(Bytes::from(format!("event: {}\ndata: {data}\n\n", event.kind())))
}

struct SubscriberState {
    subscriber_id: String,
    receiver: Receiver<PushMessage>,
    heartbeat: Interval,
    snapshot: Option<SyncEvent>,
}

/// The frames for one subscriber.
///
/// `receiver` must be subscribed *before* the snapshot is read, so that no change committed in between is lost. A
/// change that lands in both is harmless; clients ignore statuses they have already seen.
pub fn subscriber_stream(
    subscriber_id: String,
    receiver: Receiver<PushMessage>,
    snapshot: Vec<Order>,
    heartbeat: Duration,
) -> impl Stream<Item = Result<Bytes, ServerError>> {
    let state = SubscriberState {
        subscriber_id,
        receiver,
        heartbeat: interval_at(Instant::now() + heartbeat, heartbeat),
        snapshot: Some(SyncEvent::Snapshot { orders: snapshot }),
    };
    stream::unfold(state, |mut state| async move {
        if let Some(snapshot) = state.snapshot.take() {
            return Some((sse_frame(&snapshot), state));
        }
        let event = next_event(&mut state).await?;
        Some((sse_frame(&event), state))
    })
}

async fn next_event(state: &mut SubscriberState) -> Option<SyncEvent> {
    loop {
        tokio::select! {
            msg = state.receiver.recv() => match msg {
                Ok(msg) if msg.subscriber_id == state.subscriber_id => return Some(msg.event),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => {
                    warn!("📬️ Push stream for {} fell {n} messages behind. Closing it.", state.subscriber_id);
                    return None;
                },
                Err(RecvError::Closed) => {
                    debug!("📬️ Push transport closed. Ending stream for {}", state.subscriber_id);
                    return None;
                },
            },
            _ = state.heartbeat.tick() => return Some(SyncEvent::Heartbeat),
        }
    }
}
