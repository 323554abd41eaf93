//! Message envelope exchanged between agents.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// Purpose of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Periodic status broadcast (battery, excess, needs).
    Status,
    /// Request for energy from a peer.
    Request,
    /// Energy offered for sale.
    Offer,
    /// Acceptance of an offer.
    Accept,
    /// Rejection of an offer or request.
    Reject,
}

/// Addressee of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// A single agent.
    Agent(AgentId),
    /// Every agent except the sender.
    Broadcast,
}

/// Structured message body. Unused fields are left as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Sender battery level as a fraction of capacity (0.0 to 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_fraction: Option<f32>,
    /// Shareable surplus (kWh).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_kwh: Option<f32>,
    /// Energy deficit or restock requirement (kWh).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_kwh: Option<f32>,
    /// Energy requested, offered or accepted (kWh).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_kwh: Option<f32>,
    /// Asking price (per kWh).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kwh: Option<f32>,
    /// Offer the message refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
}

impl Payload {
    /// Status body: battery fraction, excess and needs.
    pub fn status(battery_fraction: f32, excess_kwh: f32, needs_kwh: f32) -> Self {
        Self {
            battery_fraction: Some(battery_fraction),
            excess_kwh: Some(excess_kwh),
            needs_kwh: Some(needs_kwh),
            ..Self::default()
        }
    }

    /// Body carrying only an energy amount.
    pub fn energy(energy_kwh: f32) -> Self {
        Self {
            energy_kwh: Some(energy_kwh),
            ..Self::default()
        }
    }

    /// Attaches an offer reference and price.
    pub fn with_offer(mut self, offer_id: impl Into<String>, price_per_kwh: f32) -> Self {
        self.offer_id = Some(offer_id.into());
        self.price_per_kwh = Some(price_per_kwh);
        self
    }
}

/// A message routed through [`super::CommunicationProtocol`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sending agent.
    pub sender_id: AgentId,
    /// Addressee, or broadcast.
    pub receiver: Recipient,
    /// Message purpose.
    pub kind: MessageKind,
    /// Structured body.
    pub payload: Payload,
    /// Creation time in seconds (wall-clock epoch or simulated time).
    pub timestamp: f64,
    /// Delivery priority; higher values are read first.
    pub priority: i32,
}

impl Message {
    /// Creates a message addressed to one agent with default priority.
    pub fn direct(
        sender_id: AgentId,
        receiver_id: AgentId,
        kind: MessageKind,
        payload: Payload,
        timestamp: f64,
    ) -> Self {
        Self {
            sender_id,
            receiver: Recipient::Agent(receiver_id),
            kind,
            payload,
            timestamp,
            priority: 0,
        }
    }

    /// Creates a broadcast message with default priority.
    pub fn broadcast(sender_id: AgentId, kind: MessageKind, payload: Payload, timestamp: f64) -> Self {
        Self {
            sender_id,
            receiver: Recipient::Broadcast,
            kind,
            payload,
            timestamp,
            priority: 0,
        }
    }

    /// Sets the delivery priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns `true` for broadcast messages.
    pub fn is_broadcast(&self) -> bool {
        self.receiver == Recipient::Broadcast
    }

    /// Returns `true` when the message is addressed directly to `agent_id`.
    pub fn is_addressed_to(&self, agent_id: AgentId) -> bool {
        self.receiver == Recipient::Agent(agent_id)
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
