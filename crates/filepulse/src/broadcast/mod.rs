//! Per-file progress fan-out.
//!
//! The pipeline publishes [`FileEvent`]s for a file id; every observer
//! currently registered for that id receives the JSON-encoded
//! [`EventEnvelope`]. Observers whose send fails are pruned on the spot.

pub mod connection;
pub mod events;
pub mod progress_broadcaster;

pub use connection::{ChannelConnection, Connection, ConnectionId, ConnectionInfo, Subscription};
pub use events::{EventData, EventEnvelope, EventKind, FileEvent};
pub use progress_broadcaster::ProgressBroadcaster;
