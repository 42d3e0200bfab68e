//! Notification fan-out.
//!
//! Committed order events are turned into [`SyncEvent`]s addressed to the order's parties and handed to a
//! [`PushTransport`]. Delivery is best effort and at-least-once; subscribers reconcile duplicates on their side.
mod fanout;
mod sync_event;
mod transport;

pub use fanout::NotificationFanout;
pub use sync_event::{PushMessage, SyncEvent};
pub use transport::{BroadcastPushTransport, PushError, PushTransport};
