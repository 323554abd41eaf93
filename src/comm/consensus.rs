//! Swarm-wide majority voting.

use std::collections::HashMap;

use tracing::debug;

use crate::agent::AgentId;

/// Ballot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteStatus {
    /// Accepting votes.
    Open,
    /// Closed with a strict majority in favour.
    Passed,
    /// Closed without a strict majority in favour (ties included).
    Rejected,
}

/// A ballot over an arbitrary proposal payload.
#[derive(Debug, Clone)]
pub struct Proposal<P> {
    /// Ballot identifier.
    pub proposal_id: String,
    /// The proposal being voted on.
    pub proposal: P,
    /// Agents voting in favour, in casting order.
    pub votes_for: Vec<AgentId>,
    /// Agents voting against, in casting order.
    pub votes_against: Vec<AgentId>,
    /// Current state.
    pub status: VoteStatus,
}

impl<P> Proposal<P> {
    fn has_voted(&self, agent_id: AgentId) -> bool {
        self.votes_for.contains(&agent_id) || self.votes_against.contains(&agent_id)
    }

    fn total_votes(&self) -> usize {
        self.votes_for.len() + self.votes_against.len()
    }
}

/// Simple-majority consensus among a fixed number of agents.
///
/// Each agent may vote once per ballot; repeat votes are refused. A ballot
/// closes automatically when every agent has voted.
#[derive(Debug, Clone)]
pub struct ConsensusProtocol<P> {
    num_agents: usize,
    ballots: HashMap<String, Proposal<P>>,
}

impl<P> ConsensusProtocol<P> {
    /// Creates a protocol for a swarm of `num_agents`.
    pub fn new(num_agents: usize) -> Self {
        Self {
            num_agents,
            ballots: HashMap::new(),
        }
    }

    /// Opens a ballot. Returns `false` if the id is already in use.
    pub fn start_vote(&mut self, proposal_id: impl Into<String>, proposal: P) -> bool {
        let proposal_id = proposal_id.into();
        if self.ballots.contains_key(&proposal_id) {
            return false;
        }
        self.ballots.insert(
            proposal_id.clone(),
            Proposal {
                proposal_id,
                proposal,
                votes_for: Vec::new(),
                votes_against: Vec::new(),
                status: VoteStatus::Open,
            },
        );
        true
    }

    /// Records a vote (`true` = for).
    ///
    /// Returns `false` if the ballot is unknown, closed, or the agent has
    /// already voted on it.
    pub fn cast_vote(&mut self, proposal_id: &str, agent_id: AgentId, vote: bool) -> bool {
        let Some(ballot) = self.ballots.get_mut(proposal_id) else {
            return false;
        };
        if ballot.status != VoteStatus::Open || ballot.has_voted(agent_id) {
            return false;
        }

        if vote {
            ballot.votes_for.push(agent_id);
        } else {
            ballot.votes_against.push(agent_id);
        }

        if ballot.total_votes() >= self.num_agents {
            self.close_vote(proposal_id);
        }
        true
    }

    /// Closes a ballot and returns whether it passed.
    ///
    /// Strict majority wins; ties are rejected. Closing an already closed
    /// ballot returns its recorded outcome. Returns `None` for unknown ids.
    pub fn close_vote(&mut self, proposal_id: &str) -> Option<bool> {
        let ballot = self.ballots.get_mut(proposal_id)?;
        if ballot.status == VoteStatus::Open {
            ballot.status = if ballot.votes_for.len() > ballot.votes_against.len() {
                VoteStatus::Passed
            } else {
                VoteStatus::Rejected
            };
            debug!(
                proposal_id,
                votes_for = ballot.votes_for.len(),
                votes_against = ballot.votes_against.len(),
                status = ?ballot.status,
                "ballot closed"
            );
        }
        Some(ballot.status == VoteStatus::Passed)
    }

    /// Returns the ballot with the given id.
    pub fn get_vote_result(&self, proposal_id: &str) -> Option<&Proposal<P>> {
        self.ballots.get(proposal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_for_one_against_passes() {
        let mut consensus = ConsensusProtocol::new(3);
        consensus.start_vote("p1", "raise reserve");
        assert!(consensus.cast_vote("p1", 0, true));
        assert!(consensus.cast_vote("p1", 1, false));
        assert!(consensus.cast_vote("p1", 2, true));

        let ballot = consensus.get_vote_result("p1").unwrap();
        assert_eq!(ballot.status, VoteStatus::Passed);
    }

    #[test]
    fn two_against_one_for_rejects() {
        let mut consensus = ConsensusProtocol::new(3);
        consensus.start_vote("p1", ());
        consensus.cast_vote("p1", 0, false);
        consensus.cast_vote("p1", 1, true);
        consensus.cast_vote("p1", 2, false);

        assert_eq!(
            consensus.get_vote_result("p1").unwrap().status,
            VoteStatus::Rejected
        );
    }

    #[test]
    fn tie_is_rejected() {
        let mut consensus = ConsensusProtocol::new(4);
        consensus.start_vote("p1", ());
        consensus.cast_vote("p1", 0, true);
        consensus.cast_vote("p1", 1, false);
        consensus.cast_vote("p1", 2, true);
        consensus.cast_vote("p1", 3, false);

        assert_eq!(
            consensus.get_vote_result("p1").unwrap().status,
            VoteStatus::Rejected
        );
        assert_eq!(consensus.close_vote("p1"), Some(false));
    }

    #[test]
    fn closed_ballot_refuses_votes() {
        let mut consensus = ConsensusProtocol::new(5);
        consensus.start_vote("p1", ());
        consensus.cast_vote("p1", 0, true);
        assert_eq!(consensus.close_vote("p1"), Some(true));
        assert!(!consensus.cast_vote("p1", 1, false));
    }

    #[test]
    fn repeat_votes_are_refused() {
        let mut consensus = ConsensusProtocol::new(3);
        consensus.start_vote("p1", ());
        assert!(consensus.cast_vote("p1", 0, true));
        assert!(!consensus.cast_vote("p1", 0, true));
        assert!(!consensus.cast_vote("p1", 0, false));

        let ballot = consensus.get_vote_result("p1").unwrap();
        assert_eq!(ballot.votes_for, vec![0]);
        assert!(ballot.votes_against.is_empty());
        assert_eq!(ballot.status, VoteStatus::Open);
    }

    #[test]
    fn unknown_and_duplicate_ids() {
        let mut consensus: ConsensusProtocol<()> = ConsensusProtocol::new(2);
        assert!(!consensus.cast_vote("missing", 0, true));
        assert_eq!(consensus.close_vote("missing"), None);

        assert!(consensus.start_vote("p1", ()));
        assert!(!consensus.start_vote("p1", ()));
    }
}
