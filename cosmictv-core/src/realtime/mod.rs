pub mod events;
pub mod hub;

pub use events::StreamEvent;
pub use hub::{ConnectionId, StreamHub};
