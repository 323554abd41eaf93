//! Household agents and their energy-management decisions.
//!
//! An [`Agent`] holds one household's battery, instantaneous production and
//! consumption, and the ids of its neighbors. Each tick the agent asks an
//! [`AgentPolicy`] for a [`Decision`] (pure), then applies it to its own
//! battery. Grid and sharing amounts are only reported; the simulator
//! aggregates them.

pub mod policy;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::comm::{Message, MessageKind, Payload};

pub use policy::{AgentPolicy, LearnedPolicy, Policy, RuleBasedPolicy};

/// Stable agent identifier, unique within a simulation run.
pub type AgentId = usize;

/// Battery fraction above which surplus production is shareable.
pub const EXCESS_BATTERY_FRACTION: f32 = 0.7;
/// Battery fraction below which the agent asks to be restocked.
pub const LOW_BATTERY_FRACTION: f32 = 0.3;
/// Battery fraction the restock request aims for.
pub const RESTOCK_BATTERY_FRACTION: f32 = 0.5;
/// Battery fraction the charge branch fills up to.
pub const CHARGE_TARGET_FRACTION: f32 = 0.9;
/// Minimum excess (kWh) before an agent looks for a neighbor to share with.
pub const SHARE_THRESHOLD_KWH: f32 = 2.0;

/// Discrete energy-management action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Store energy in the agent's own battery.
    ChargeBattery,
    /// Give energy to a neighbor.
    ShareEnergy,
    /// Export surplus to the grid.
    SellToGrid,
    /// Signal a deficit to be covered externally.
    RequestEnergy,
}

impl Action {
    /// Every action, in cascade order.
    pub const ALL: [Action; 4] = [
        Action::ChargeBattery,
        Action::ShareEnergy,
        Action::SellToGrid,
        Action::RequestEnergy,
    ];

    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ChargeBattery => "charge_battery",
            Action::ShareEnergy => "share_energy",
            Action::SellToGrid => "sell_to_grid",
            Action::RequestEnergy => "request_energy",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intended action for one tick, produced without mutating the agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Deciding agent.
    pub agent_id: AgentId,
    /// Chosen action.
    pub action: Action,
    /// Energy reported for the action (kWh).
    #[serde(rename = "amount")]
    pub amount_kwh: f32,
    /// Receiving neighbor for [`Action::ShareEnergy`].
    pub target: Option<AgentId>,
    /// Change to apply to the agent's own battery (kWh, negative discharges).
    #[serde(skip)]
    pub battery_delta_kwh: f32,
}

impl Decision {
    /// Decision that reports an amount without touching the battery.
    pub fn report(agent_id: AgentId, action: Action, amount_kwh: f32) -> Self {
        Self {
            agent_id,
            action,
            amount_kwh,
            target: None,
            battery_delta_kwh: 0.0,
        }
    }

    /// Decision that charges the battery by `amount_kwh`.
    pub fn charge(agent_id: AgentId, amount_kwh: f32) -> Self {
        Self {
            battery_delta_kwh: amount_kwh,
            ..Self::report(agent_id, Action::ChargeBattery, amount_kwh)
        }
    }

    /// Decision that shares `amount_kwh` with `target`.
    pub fn share(agent_id: AgentId, target: AgentId, amount_kwh: f32) -> Self {
        Self {
            target: Some(target),
            ..Self::report(agent_id, Action::ShareEnergy, amount_kwh)
        }
    }

    /// Adds a battery change on top of the reported action.
    pub fn with_battery_delta(mut self, battery_delta_kwh: f32) -> Self {
        self.battery_delta_kwh = battery_delta_kwh;
        self
    }
}

/// Live view of one neighbor, as seen by a deciding agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborState {
    /// Neighbor id.
    pub id: AgentId,
    /// Neighbor's current [`Agent::calculate_needs`].
    pub needs_kwh: f32,
    /// Neighbor battery level as a fraction of capacity.
    pub battery_fraction: f32,
}

impl NeighborState {
    /// Captures the current state of `agent`.
    pub fn of(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            needs_kwh: agent.calculate_needs(),
            battery_fraction: agent.battery_fraction(),
        }
    }
}

/// Everything a policy may look at besides the agent itself.
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    /// Hour of the day (0-23).
    pub hour: usize,
    /// Neighbors in the agent's neighbor-list order.
    pub neighbors: Vec<NeighborState>,
}

impl DecisionContext {
    /// Context for an isolated agent.
    pub fn new(hour: usize) -> Self {
        Self {
            hour,
            neighbors: Vec::new(),
        }
    }

    /// Attaches neighbor views.
    pub fn with_neighbors(mut self, neighbors: Vec<NeighborState>) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// First neighbor, in list order, that currently needs energy.
    pub fn first_needy_neighbor(&self) -> Option<&NeighborState> {
        self.neighbors.iter().find(|n| n.needs_kwh > 0.0)
    }

    /// Mean neighbor battery fraction, or 0.5 with no neighbors.
    pub fn neighbor_avg_battery(&self) -> f32 {
        if self.neighbors.is_empty() {
            return 0.5;
        }
        self.neighbors.iter().map(|n| n.battery_fraction).sum::<f32>() / self.neighbors.len() as f32
    }
}

/// One household: solar, battery and consumption.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Stable id.
    pub id: AgentId,
    /// Battery capacity (kWh), fixed at creation.
    pub battery_capacity_kwh: f32,
    /// Stored energy (kWh), kept within `[0, battery_capacity_kwh]` by [`Agent::apply`].
    pub battery_level_kwh: f32,
    /// Instantaneous production (kW).
    pub production_kw: f32,
    /// Instantaneous consumption (kW).
    pub consumption_kw: f32,
    neighbors: Vec<AgentId>,
    inbox: Vec<Message>,
}

impl Agent {
    /// Creates an agent with its battery at 50 % of capacity.
    pub fn new(id: AgentId, battery_capacity_kwh: f32) -> Self {
        let battery_capacity_kwh = battery_capacity_kwh.max(0.0);
        Self {
            id,
            battery_capacity_kwh,
            battery_level_kwh: battery_capacity_kwh * 0.5,
            production_kw: 0.0,
            consumption_kw: 0.0,
            neighbors: Vec::new(),
            inbox: Vec::new(),
        }
    }

    /// Sets the neighbor list. Called once when the topology is wired.
    pub fn with_neighbors(mut self, neighbors: Vec<AgentId>) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Neighbor ids, in list order.
    pub fn neighbors(&self) -> &[AgentId] {
        &self.neighbors
    }

    /// Messages received since the inbox was last cleared.
    pub fn inbox(&self) -> &[Message] {
        &self.inbox
    }

    /// Overwrites production and consumption for the current tick.
    ///
    /// Inputs are expected to be non-negative; this is not checked.
    pub fn update_state(&mut self, production_kw: f32, consumption_kw: f32) {
        self.production_kw = production_kw;
        self.consumption_kw = consumption_kw;
    }

    /// Battery level as a fraction of capacity (0 for a zero-capacity battery).
    pub fn battery_fraction(&self) -> f32 {
        if self.battery_capacity_kwh > 0.0 {
            self.battery_level_kwh / self.battery_capacity_kwh
        } else {
            0.0
        }
    }

    /// Production minus consumption.
    pub fn net_energy(&self) -> f32 {
        self.production_kw - self.consumption_kw
    }

    /// Shareable surplus: positive net production while the battery is above 70 %.
    pub fn calculate_excess(&self) -> f32 {
        let net = self.net_energy();
        if net > 0.0 && self.battery_level_kwh > EXCESS_BATTERY_FRACTION * self.battery_capacity_kwh {
            net
        } else {
            0.0
        }
    }

    /// Current deficit, or the gap to 50 % when the battery is below 30 %.
    pub fn calculate_needs(&self) -> f32 {
        let net = self.net_energy();
        if net < 0.0 {
            -net
        } else if self.battery_level_kwh < LOW_BATTERY_FRACTION * self.battery_capacity_kwh {
            RESTOCK_BATTERY_FRACTION * self.battery_capacity_kwh - self.battery_level_kwh
        } else {
            0.0
        }
    }

    /// Asks `policy` for this tick's action without changing any state.
    pub fn decide<P: AgentPolicy + ?Sized>(&self, policy: &P, ctx: &DecisionContext) -> Decision {
        policy.decide(self, ctx)
    }

    /// Applies a decision's battery change, clamped to `[0, capacity]`.
    pub fn apply(&mut self, decision: &Decision) {
        self.battery_level_kwh =
            (self.battery_level_kwh + decision.battery_delta_kwh).clamp(0.0, self.battery_capacity_kwh);
    }

    /// Decides and applies in one call.
    pub fn make_decision<P: AgentPolicy + ?Sized>(&mut self, policy: &P, ctx: &DecisionContext) -> Decision {
        let decision = self.decide(policy, ctx);
        self.apply(&decision);
        decision
    }

    /// Status broadcast carrying battery fraction, excess and needs.
    pub fn communicate(&self, timestamp: f64) -> Message {
        Message::broadcast(
            self.id,
            MessageKind::Status,
            Payload::status(self.battery_fraction(), self.calculate_excess(), self.calculate_needs()),
            timestamp,
        )
    }

    /// Appends a message to the inbox.
    pub fn receive_message(&mut self, message: Message) {
        self.inbox.push(message);
    }

    /// Empties the inbox.
    pub fn clear_inbox(&mut self) {
        self.inbox.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(production: f32, consumption: f32, level: f32) -> Agent {
        let mut a = Agent::new(0, 10.0);
        a.update_state(production, consumption);
        a.battery_level_kwh = level;
        a
    }

    fn neighbor(id: AgentId, needs_kwh: f32) -> NeighborState {
        NeighborState {
            id,
            needs_kwh,
            battery_fraction: 0.5,
        }
    }

    #[test]
    fn starts_half_charged() {
        let a = Agent::new(3, 12.0);
        assert_eq!(a.battery_level_kwh, 6.0);
        assert!(a.neighbors().is_empty());
    }

    #[test]
    fn excess_with_full_enough_battery() {
        assert_eq!(agent(5.0, 2.0, 8.0).calculate_excess(), 3.0);
    }

    #[test]
    fn no_excess_at_or_below_seventy_percent() {
        for level in [0.0, 3.5, 7.0] {
            assert_eq!(agent(9.0, 1.0, level).calculate_excess(), 0.0);
        }
    }

    #[test]
    fn needs_is_deficit() {
        assert_eq!(agent(2.0, 5.0, 5.0).calculate_needs(), 3.0);
    }

    #[test]
    fn needs_restock_when_battery_low() {
        assert!((agent(3.0, 1.0, 2.0).calculate_needs() - 3.0).abs() < 1e-6);
        assert_eq!(agent(3.0, 1.0, 3.0).calculate_needs(), 0.0);
    }

    #[test]
    fn deficit_requests_energy_without_touching_battery() {
        let mut a = agent(1.0, 4.0, 5.0);
        let d = a.make_decision(&RuleBasedPolicy, &DecisionContext::new(20));
        assert_eq!(d.action, Action::RequestEnergy);
        assert_eq!(d.amount_kwh, 3.0);
        assert_eq!(a.battery_level_kwh, 5.0);
    }

    #[test]
    fn low_battery_with_surplus_charges() {
        let mut a = agent(3.0, 1.0, 1.0);
        let d = a.make_decision(&RuleBasedPolicy, &DecisionContext::new(12));
        assert_eq!(d.action, Action::ChargeBattery);
        assert_eq!(d.amount_kwh, 2.0);
        assert_eq!(a.battery_level_kwh, 3.0);
    }

    #[test]
    fn shares_with_first_needy_neighbor() {
        let a = agent(6.0, 1.0, 8.0);
        let ctx = DecisionContext::new(12).with_neighbors(vec![
            neighbor(1, 0.0),
            neighbor(2, 1.5),
            neighbor(3, 4.0),
        ]);
        let d = a.decide(&RuleBasedPolicy, &ctx);
        assert_eq!(d.action, Action::ShareEnergy);
        assert_eq!(d.target, Some(2));
        assert_eq!(d.amount_kwh, 1.5);
        assert_eq!(d.battery_delta_kwh, 0.0);
    }

    #[test]
    fn share_falls_through_when_no_neighbor_needs() {
        let a = agent(6.0, 1.0, 8.0);
        let ctx = DecisionContext::new(12).with_neighbors(vec![neighbor(1, 0.0)]);
        let d = a.decide(&RuleBasedPolicy, &ctx);
        assert_eq!(d.action, Action::ChargeBattery);
        assert_eq!(d.amount_kwh, 1.0);
    }

    #[test]
    fn full_battery_sells_excess() {
        let a = agent(4.0, 1.0, 9.5);
        let d = a.decide(&RuleBasedPolicy, &DecisionContext::new(12));
        assert_eq!(d.action, Action::SellToGrid);
        assert_eq!(d.amount_kwh, 3.0);
    }

    #[test]
    fn decide_is_pure() {
        let a = agent(3.0, 1.0, 1.0);
        let before = a.battery_level_kwh;
        let _ = a.decide(&RuleBasedPolicy, &DecisionContext::new(12));
        assert_eq!(a.battery_level_kwh, before);
    }

    #[test]
    fn apply_clamps_battery() {
        let mut a = agent(0.0, 0.0, 9.0);
        a.apply(&Decision::charge(0, 5.0));
        assert_eq!(a.battery_level_kwh, 10.0);
        a.apply(&Decision::report(0, Action::RequestEnergy, 0.0).with_battery_delta(-50.0));
        assert_eq!(a.battery_level_kwh, 0.0);
    }

    #[test]
    fn status_message_reflects_state() {
        let a = agent(5.0, 2.0, 8.0);
        let msg = a.communicate(3600.0);
        assert!(msg.is_broadcast());
        assert_eq!(msg.kind, MessageKind::Status);
        assert_eq!(msg.payload.battery_fraction, Some(0.8));
        assert_eq!(msg.payload.excess_kwh, Some(3.0));
        assert_eq!(msg.payload.needs_kwh, Some(0.0));
        assert_eq!(msg.timestamp, 3600.0);
    }

    #[test]
    fn inbox_collects_until_cleared() {
        let mut a = Agent::new(0, 10.0);
        let other = Agent::new(1, 10.0);
        a.receive_message(other.communicate(0.0));
        a.receive_message(other.communicate(1.0));
        assert_eq!(a.inbox().len(), 2);
        a.clear_inbox();
        assert!(a.inbox().is_empty());
    }

    #[test]
    fn decision_serializes_wire_names() {
        let json = serde_json::to_value(Decision::share(0, 4, 1.25)).unwrap();
        assert_eq!(json["action"], "share_energy");
        assert_eq!(json["amount"], 1.25);
        assert_eq!(json["target"], 4);
        assert!(json.get("battery_delta_kwh").is_none());
    }
}
