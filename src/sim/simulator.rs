//! Swarm orchestrator: drives the hourly tick loop.

use std::collections::BTreeMap;

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::agent::{Action, Agent, AgentId, AgentPolicy, Decision, DecisionContext, NeighborState, Policy};
use crate::anomaly::AgentSnapshot;
use crate::comm::{CommunicationProtocol, EnergyNegotiator};
use crate::devices::Device;
use crate::error::SwarmError;
use crate::forecast::HistoryRecord;
use crate::topology::Neighborhood;

use super::clock::{Clock, RunControl};
use super::types::{EnergyFlow, SimulationResult, StepReport, SwarmSettings, TickTotals};

/// Seconds of simulated time per tick.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Broadcasts at least this old (simulated seconds) are pruned each tick.
pub const BROADCAST_MAX_AGE_SECS: f64 = SECONDS_PER_HOUR;

/// Community of household agents sharing energy hour by hour.
///
/// Owns every piece of run state: agents, wiring, the random source and the
/// communication and negotiation layers. Independent simulators share
/// nothing and can run side by side.
///
/// # Examples
///
/// ```
/// use solar_swarm::sim::SwarmSimulator;
///
/// let mut sim = SwarmSimulator::with_agents(10).unwrap();
/// let result = sim.run(2).unwrap();
/// assert_eq!(result.solar_used.len(), 2);
/// assert_eq!(result.grid_import.len(), 2);
/// assert_eq!(result.shared_energy.len(), 2);
/// ```
#[derive(Debug)]
pub struct SwarmSimulator {
    settings: SwarmSettings,
    policy: Policy,
    agents: Vec<Agent>,
    neighborhood: Neighborhood,
    failed_panels: Vec<bool>,
    rng: StdRng,
    protocol: CommunicationProtocol,
    negotiator: EnergyNegotiator,
    results: SimulationResult,
    time_step: usize,
}

impl SwarmSimulator {
    /// Builds agents, wires the topology and picks failed panels.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidAgentCount`] for zero agents and
    /// [`SwarmError::InvalidTopology`] for malformed topology parameters.
    pub fn new(settings: SwarmSettings, policy: Policy) -> Result<Self, SwarmError> {
        let n = settings.num_agents;
        if n == 0 {
            return Err(SwarmError::InvalidAgentCount(n));
        }

        let mut rng = StdRng::seed_from_u64(settings.seed);
        let neighborhood = Neighborhood::build(&settings.topology, n, &mut rng)?;

        let capacity = settings.battery_capacity_kwh * settings.modifiers.battery_factor;
        let agents: Vec<Agent> = (0..n)
            .map(|id| Agent::new(id, capacity).with_neighbors(neighborhood.neighbors(id).to_vec()))
            .collect();

        let mut failed_panels = vec![false; n];
        let failed = settings.modifiers.failed_panels.min(n);
        for id in rand::seq::index::sample(&mut rng, n, failed) {
            failed_panels[id] = true;
        }

        info!(
            agents = n,
            links = neighborhood.connection_count(),
            policy = policy.name(),
            failed_panels = failed,
            seed = settings.seed,
            "swarm created"
        );

        Ok(Self {
            settings,
            policy,
            agents,
            neighborhood,
            failed_panels,
            rng,
            protocol: CommunicationProtocol::new(),
            negotiator: EnergyNegotiator::new(),
            results: SimulationResult::default(),
            time_step: 0,
        })
    }

    /// Default settings and the rule-based policy with `num_agents` households.
    pub fn with_agents(num_agents: usize) -> Result<Self, SwarmError> {
        Self::new(SwarmSettings::new(num_agents), Policy::default())
    }

    /// Agents in id order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Agent by id.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Neighbor wiring.
    pub fn neighborhood(&self) -> &Neighborhood {
        &self.neighborhood
    }

    /// Settings the run was built with.
    pub fn settings(&self) -> &SwarmSettings {
        &self.settings
    }

    /// Decision policy in use.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Per-hour series recorded so far.
    pub fn results(&self) -> &SimulationResult {
        &self.results
    }

    /// Ticks completed through [`Self::step`] or [`Self::run`].
    pub fn time_step(&self) -> usize {
        self.time_step
    }

    /// Message routing layer.
    pub fn protocol(&self) -> &CommunicationProtocol {
        &self.protocol
    }

    /// Offer book and trade ledger.
    pub fn negotiator(&self) -> &EnergyNegotiator {
        &self.negotiator
    }

    /// Returns `true` if `id`'s panels are out of service.
    pub fn is_panel_failed(&self, id: AgentId) -> bool {
        self.failed_panels.get(id).copied().unwrap_or(false)
    }

    /// Runs one tick for `hour` and returns every agent's decision.
    ///
    /// Exactly one entry is appended to each result series. Does not advance
    /// [`Self::time_step`].
    pub fn run_timestep(&mut self, hour: usize) -> Vec<Decision> {
        let now = hour as f64 * SECONDS_PER_HOUR;

        self.generate(hour);
        self.exchange_status(now);
        let decisions = self.decide_all(hour);
        self.settle_shares(&decisions, now);

        let totals = self.totals(&decisions);
        debug!(
            hour,
            solar_used = totals.solar_used,
            grid_import = totals.grid_import,
            shared = totals.shared_energy,
            "tick complete"
        );
        self.results.push(&totals);
        decisions
    }

    /// Runs one tick and returns the enriched report for live feeds.
    pub fn step(&mut self, hour: usize) -> StepReport {
        let decisions = self.run_timestep(hour);
        self.time_step += 1;
        self.report(hour, decisions)
    }

    /// Runs `hours` ticks continuing from [`Self::time_step`].
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidHours`] when `hours` is zero.
    pub fn run(&mut self, hours: usize) -> Result<SimulationResult, SwarmError> {
        self.run_with(hours, &RunControl::new())
    }

    /// Like [`Self::run`], polling `control` between ticks.
    ///
    /// A stopped control ends the run early; the ticks completed so far stay
    /// recorded.
    pub fn run_with(&mut self, hours: usize, control: &RunControl) -> Result<SimulationResult, SwarmError> {
        if hours == 0 {
            return Err(SwarmError::InvalidHours(hours));
        }
        info!(hours, start = self.time_step, "run started");

        let mut clock = Clock::starting_at(self.time_step, hours);
        let mut first = true;
        while let Some(hour) = clock.tick() {
            if !control.is_running() {
                info!(hour, "run cancelled");
                break;
            }
            if !first {
                control.pace();
            }
            first = false;

            self.run_timestep(hour);
            self.time_step += 1;
        }

        let summary = self.results.summary();
        info!(
            hours = summary.hours,
            solar_usage_pct = summary.solar_usage_pct,
            shared_kwh = summary.total_shared_kwh,
            "run finished"
        );
        Ok(self.results.clone())
    }

    /// Current state of every agent.
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        let hour = self.time_step.saturating_sub(1);
        self.agents.iter().map(|a| AgentSnapshot::of(a, hour)).collect()
    }

    /// Per-household averages for each recorded tick, usable as forecast history.
    pub fn history(&self) -> Vec<HistoryRecord> {
        let n = self.agents.len().max(1) as f32;
        let r = &self.results;
        (0..r.len())
            .map(|i| HistoryRecord {
                hour: i % 24,
                production: r.production[i] / n,
                consumption: r.consumption[i] / n,
                battery_fraction: r.avg_battery_fraction[i],
            })
            .collect()
    }

    fn generate(&mut self, hour: usize) {
        let m = &self.settings.modifiers;
        for agent in &mut self.agents {
            let mut production = self.settings.solar.power_kw(hour, &mut self.rng) * m.production_factor;
            if self.failed_panels[agent.id] {
                production = 0.0;
            }
            let consumption = self.settings.load.power_kw(hour, &mut self.rng) * m.consumption_factor;
            agent.update_state(production, consumption);
        }
    }

    fn exchange_status(&mut self, now: f64) {
        self.protocol.prune_broadcasts(now, BROADCAST_MAX_AGE_SECS);
        for agent in &self.agents {
            self.protocol.send_message(agent.communicate(now));
        }
        for agent in &mut self.agents {
            agent.clear_inbox();
            for message in self.protocol.get_messages_for_agent(agent.id) {
                agent.receive_message(message);
            }
        }
    }

    /// Agents decide in ascending id order and see earlier agents' updates.
    fn decide_all(&mut self, hour: usize) -> Vec<Decision> {
        let mut decisions = Vec::with_capacity(self.agents.len());
        for i in 0..self.agents.len() {
            let neighbors = self.agents[i]
                .neighbors()
                .iter()
                .filter_map(|&j| self.agents.get(j))
                .map(NeighborState::of)
                .collect();
            let ctx = DecisionContext::new(hour % 24).with_neighbors(neighbors);
            decisions.push(self.agents[i].make_decision(&self.policy, &ctx));
        }
        decisions
    }

    fn settle_shares(&mut self, decisions: &[Decision], now: f64) {
        let price = self.settings.economics.peer_price_per_kwh;
        for d in decisions.iter().filter(|d| d.action == Action::ShareEnergy) {
            let Some(buyer) = d.target else { continue };
            let offer_id = self.negotiator.create_offer_at(d.agent_id, d.amount_kwh, price, now);
            self.negotiator.accept_offer_at(&offer_id, buyer, d.amount_kwh, now);
        }
    }

    fn totals(&self, decisions: &[Decision]) -> TickTotals {
        let mut t = TickTotals {
            shared_energy: decisions
                .iter()
                .filter(|d| d.action == Action::ShareEnergy)
                .map(|d| d.amount_kwh)
                .sum(),
            ..TickTotals::default()
        };
        for a in &self.agents {
            t.solar_used += a.production_kw.min(a.consumption_kw);
            t.grid_import += (a.consumption_kw - a.production_kw).max(0.0);
            t.production += a.production_kw;
            t.consumption += a.consumption_kw;
            t.avg_battery_fraction += a.battery_fraction();
        }
        if !self.agents.is_empty() {
            t.avg_battery_fraction /= self.agents.len() as f32;
        }
        t
    }

    fn report(&self, hour: usize, decisions: Vec<Decision>) -> StepReport {
        let totals = self.totals(&decisions);
        let economics = &self.settings.economics;

        let energy_flows: Vec<EnergyFlow> = decisions
            .iter()
            .filter(|d| d.action == Action::ShareEnergy)
            .filter_map(|d| {
                d.target.map(|to| EnergyFlow {
                    from: d.agent_id,
                    to,
                    amount: d.amount_kwh,
                })
            })
            .collect();
        let total_shared: f32 = energy_flows.iter().map(|f| f.amount).sum();

        let mut decision_stats = BTreeMap::new();
        for d in &decisions {
            *decision_stats.entry(d.action.to_string()).or_insert(0) += 1;
        }
        let successful_shares = decisions
            .iter()
            .filter(|d| d.action == Action::ShareEnergy && d.amount_kwh > 0.0)
            .count();
        let decision_efficiency = if decisions.is_empty() {
            0.0
        } else {
            successful_shares as f32 / decisions.len() as f32 * 100.0
        };

        StepReport {
            hour,
            energy_transfers: energy_flows.clone(),
            energy_flows,
            solar_usage_pct: if totals.production > 0.0 {
                totals.solar_used / totals.production * 100.0
            } else {
                0.0
            },
            avg_battery: totals.avg_battery_fraction * 100.0,
            cost_savings: total_shared * economics.peer_price_per_kwh,
            co2_saved: total_shared * economics.co2_kg_per_kwh,
            agent_decisions: decisions,
            decision_stats,
            decision_efficiency,
            total_production: totals.production,
            total_consumption: totals.consumption,
            total_solar_used: totals.solar_used,
            total_grid_import: totals.grid_import,
            total_shared,
            active_agents: self
                .agents
                .iter()
                .filter(|a| a.production_kw > 0.0 || a.consumption_kw > 0.0)
                .count(),
            network_connections: self.agents.iter().map(|a| a.neighbors().len()).sum(),
        }
    }
}
