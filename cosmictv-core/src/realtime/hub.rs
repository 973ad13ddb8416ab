//! In-memory publish/subscribe hub, one topic per stream id.
//!
//! Broadcast is fire-and-forget: events go out over unbounded channels,
//! so a slow or gone subscriber can never delay the mutating API call
//! that produced the event. Send failures mark the connection for
//! cleanup instead of propagating.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::StreamEvent;
use crate::models::{ChannelId, ViewerId};

/// Handle for a client connection subscription
pub type ConnectionId = String;

/// Message sender for a client connection
pub type EventSender = mpsc::UnboundedSender<StreamEvent>;

#[derive(Debug, Clone)]
struct Subscriber {
    connection_id: ConnectionId,
    viewer_id: ViewerId,
    sender: EventSender,
}

/// Routes stream events to the connections subscribed to each topic.
#[derive(Debug, Default)]
pub struct StreamHub {
    /// Map of stream_id -> subscribers of that topic
    topics: DashMap<ChannelId, Vec<Subscriber>>,

    /// Map of connection_id -> topics it joined, for cleanup
    connections: DashMap<ConnectionId, Vec<ChannelId>>,
}

impl StreamHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a stream topic.
    ///
    /// One connection may join several topics with the same sender; each
    /// join is undone by `unsubscribe` or, wholesale, by
    /// `unsubscribe_all` on disconnect.
    pub fn subscribe(
        &self,
        stream_id: ChannelId,
        viewer_id: ViewerId,
        connection_id: ConnectionId,
        sender: EventSender,
    ) {
        let subscriber = Subscriber {
            connection_id: connection_id.clone(),
            viewer_id: viewer_id.clone(),
            sender,
        };

        let mut subscribers = self.topics.entry(stream_id.clone()).or_default();
        subscribers.retain(|sub| sub.connection_id != connection_id);
        subscribers.push(subscriber);
        drop(subscribers);

        let mut joined = self.connections.entry(connection_id.clone()).or_default();
        if !joined.contains(&stream_id) {
            joined.push(stream_id.clone());
        }
        drop(joined);

        info!(
            stream_id = %stream_id,
            viewer_id = %viewer_id,
            connection_id = %connection_id,
            "Client subscribed to stream"
        );
    }

    /// Remove one connection from one topic.
    pub fn unsubscribe(&self, connection_id: &str, stream_id: &ChannelId) {
        if let Some(mut subscribers) = self.topics.get_mut(stream_id) {
            subscribers.retain(|sub| sub.connection_id != connection_id);
            if subscribers.is_empty() {
                drop(subscribers);
                self.topics.remove(stream_id);
                debug!(stream_id = %stream_id, "Topic has no more subscribers, removed");
            }
        }

        if let Some(mut joined) = self.connections.get_mut(connection_id) {
            joined.retain(|s| s != stream_id);
            if joined.is_empty() {
                drop(joined);
                self.connections.remove(connection_id);
            }
        }
    }

    /// Remove a connection from every topic it joined, returning them.
    pub fn unsubscribe_all(&self, connection_id: &str) -> Vec<ChannelId> {
        let Some((_, joined)) = self.connections.remove(connection_id) else {
            return Vec::new();
        };

        for stream_id in &joined {
            if let Some(mut subscribers) = self.topics.get_mut(stream_id) {
                subscribers.retain(|sub| sub.connection_id != connection_id);
                if subscribers.is_empty() {
                    drop(subscribers);
                    self.topics.remove(stream_id);
                }
            }
        }

        info!(
            connection_id = %connection_id,
            topics = joined.len(),
            "Client unsubscribed from all streams"
        );
        joined
    }

    /// Broadcast an event to all subscribers of its topic.
    ///
    /// Returns how many subscribers it reached. Dead connections found
    /// along the way are unsubscribed.
    pub fn broadcast(&self, event: &StreamEvent) -> usize {
        let stream_id = event.stream_id().clone();
        let mut sent_count = 0;
        let mut failed_connections = Vec::new();

        if let Some(subscribers) = self.topics.get(&stream_id) {
            for subscriber in subscribers.iter() {
                match subscriber.sender.send(event.clone()) {
                    Ok(()) => sent_count += 1,
                    Err(_) => {
                        warn!(
                            stream_id = %stream_id,
                            viewer_id = %subscriber.viewer_id,
                            connection_id = %subscriber.connection_id,
                            "Subscriber channel closed, marking for cleanup"
                        );
                        failed_connections.push(subscriber.connection_id.clone());
                    }
                }
            }
        }

        for conn_id in failed_connections {
            self.unsubscribe(&conn_id, &stream_id);
        }

        if sent_count > 0 {
            debug!(
                stream_id = %stream_id,
                sent_count,
                event_type = event.event_type(),
                "Event broadcast complete"
            );
        }

        sent_count
    }

    /// Number of subscribers on one topic.
    #[must_use]
    pub fn subscriber_count(&self, stream_id: &ChannelId) -> usize {
        self.topics.get(stream_id).map_or(0, |subs| subs.len())
    }

    /// Number of topics with at least one subscriber.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Number of distinct connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
