//! Message passing between agents.

use std::cmp::Reverse;

use tracing::debug;

use super::message::{Message, MessageKind, Payload, now_secs};
use crate::agent::AgentId;

/// Routes direct messages and shared broadcasts between agents.
///
/// Direct messages are consumed on retrieval. Broadcasts stay visible to
/// every other agent until pruned by age. Every message ever sent is kept in
/// an append-only history log.
#[derive(Debug, Default, Clone)]
pub struct CommunicationProtocol {
    queue: Vec<Message>,
    broadcasts: Vec<Message>,
    history: Vec<Message>,
}

impl CommunicationProtocol {
    /// Creates an empty protocol.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message for delivery and records it in the history log.
    ///
    /// Broadcast-addressed messages go to the broadcast pool instead of the
    /// delivery queue.
    pub fn send_message(&mut self, message: Message) {
        self.history.push(message.clone());
        if message.is_broadcast() {
            self.broadcasts.push(message);
        } else {
            self.queue.push(message);
        }
    }

    /// Broadcasts a message stamped with the current wall-clock time.
    pub fn broadcast(&mut self, sender_id: AgentId, kind: MessageKind, payload: Payload) {
        self.send_message(Message::broadcast(sender_id, kind, payload, now_secs()));
    }

    /// Returns direct messages for `agent_id` plus broadcasts from other
    /// senders, highest priority first.
    ///
    /// Direct messages are removed from the queue; broadcasts are not.
    pub fn get_messages_for_agent(&mut self, agent_id: AgentId) -> Vec<Message> {
        let (mut delivered, remaining): (Vec<Message>, Vec<Message>) = self
            .queue
            .drain(..)
            .partition(|m| m.is_addressed_to(agent_id));
        self.queue = remaining;

        delivered.extend(
            self.broadcasts
                .iter()
                .filter(|m| m.sender_id != agent_id)
                .cloned(),
        );
        delivered.sort_by_key(|m| Reverse(m.priority));
        delivered
    }

    /// Prunes broadcasts older than `max_age_secs` relative to wall-clock now.
    pub fn clear_old_broadcasts(&mut self, max_age_secs: f64) {
        self.prune_broadcasts(now_secs(), max_age_secs);
    }

    /// Prunes broadcasts whose age at `now` is `max_age_secs` or more.
    pub fn prune_broadcasts(&mut self, now: f64, max_age_secs: f64) {
        let before = self.broadcasts.len();
        self.broadcasts.retain(|m| now - m.timestamp < max_age_secs);
        let pruned = before - self.broadcasts.len();
        if pruned > 0 {
            debug!(pruned, remaining = self.broadcasts.len(), "pruned broadcasts");
        }
    }

    /// Number of direct messages awaiting delivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Broadcasts currently visible.
    pub fn broadcasts(&self) -> &[Message] {
        &self.broadcasts
    }

    /// Every message sent, in send order.
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}
