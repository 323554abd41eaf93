//! Inter-agent communication: messages, routing, offers and voting.

/// Majority voting among swarm members.
pub mod consensus;
pub mod message;
/// Message routing and broadcast pool.
pub mod protocol;
/// Peer-to-peer energy offers and trades.
pub mod negotiation;

pub use consensus::{ConsensusProtocol, Proposal, VoteStatus};
pub use message::{Message, MessageKind, Payload, Recipient};
pub use negotiation::{EnergyNegotiator, Offer, OfferStatus, Trade};
pub use protocol::CommunicationProtocol;
