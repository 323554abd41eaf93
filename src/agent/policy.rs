//! Decision policies, selected once when the simulation is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    Action, Agent, CHARGE_TARGET_FRACTION, Decision, DecisionContext, SHARE_THRESHOLD_KWH,
};
use crate::error::SwarmError;

/// Turns an agent's state into one [`Decision`] without mutating anything.
pub trait AgentPolicy {
    /// Chooses this tick's action for `agent`.
    fn decide(&self, agent: &Agent, ctx: &DecisionContext) -> Decision;

    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;
}

/// Fixed-priority rule cascade.
///
/// 1. Cover own needs: charge from surplus, otherwise request energy.
/// 2. With more than 2 kWh excess, share with the first needy neighbor.
/// 3. Below 90 % battery, charge with the excess.
/// 4. Otherwise sell the excess to the grid.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedPolicy;

impl AgentPolicy for RuleBasedPolicy {
    fn decide(&self, agent: &Agent, ctx: &DecisionContext) -> Decision {
        let id = agent.id;
        let excess = agent.calculate_excess();
        let needs = agent.calculate_needs();

        if needs > 0.0 {
            if agent.production_kw > agent.consumption_kw {
                return Decision::charge(id, needs.min(agent.net_energy()));
            }
            return Decision::report(id, Action::RequestEnergy, needs);
        }

        if excess > SHARE_THRESHOLD_KWH
            && let Some(neighbor) = ctx.first_needy_neighbor()
        {
            return Decision::share(id, neighbor.id, excess.min(neighbor.needs_kwh));
        }

        let charge_target = CHARGE_TARGET_FRACTION * agent.battery_capacity_kwh;
        if agent.battery_level_kwh < charge_target {
            return Decision::charge(id, excess.min(charge_target - agent.battery_level_kwh));
        }

        Decision::report(id, Action::SellToGrid, excess)
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}

/// Number of state features fed to [`LearnedPolicy`].
pub const STATE_DIM: usize = 5;
/// Number of outputs produced by [`LearnedPolicy`].
pub const ACTION_DIM: usize = 3;

const CHARGE_PCT_THRESHOLD: f32 = 0.1;
const SHARE_AMOUNT_THRESHOLD: f32 = 0.5;
const SELL_AMOUNT_THRESHOLD: f32 = 0.5;

/// Linear actor trained offline and loaded from a TOML weights file.
///
/// The state vector is
/// `[battery_fraction, production / 10, consumption / 10, hour / 24, neighbor_avg_battery]`
/// (power terms capped at 1) and the outputs are `[charge_pct, share_kwh, sell_kwh]`.
///
/// ```toml
/// weights = [
///   [0.8, 0.5, -0.2, 0.0, 0.0],
///   [0.0, 6.0, -2.0, 0.0, -1.0],
///   [0.0, 4.0, -1.0, 0.0, 0.0],
/// ]
/// bias = [0.0, 0.0, 0.0]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearnedPolicy {
    /// Row `i` maps the state vector to output `i`.
    pub weights: [[f32; STATE_DIM]; ACTION_DIM],
    /// Output offsets.
    #[serde(default)]
    pub bias: [f32; ACTION_DIM],
}

impl LearnedPolicy {
    /// Loads weights from a TOML file.
    ///
    /// A missing or malformed file is an error; there is no silent fallback
    /// to the rule cascade.
    pub fn load(path: &Path) -> Result<Self, SwarmError> {
        let text = std::fs::read_to_string(path).map_err(|source| SwarmError::PolicyLoad {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SwarmError::PolicyParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Normalized state vector for `agent`.
    pub fn state_vector(agent: &Agent, ctx: &DecisionContext) -> [f32; STATE_DIM] {
        [
            agent.battery_fraction(),
            (agent.production_kw / 10.0).min(1.0),
            (agent.consumption_kw / 10.0).min(1.0),
            (ctx.hour % 24) as f32 / 24.0,
            ctx.neighbor_avg_battery(),
        ]
    }

    /// Raw actor outputs for a state vector.
    pub fn forward(&self, state: &[f32; STATE_DIM]) -> [f32; ACTION_DIM] {
        let mut out = self.bias;
        for (o, row) in out.iter_mut().zip(&self.weights) {
            *o += row.iter().zip(state).map(|(w, s)| w * s).sum::<f32>();
        }
        out
    }
}

impl AgentPolicy for LearnedPolicy {
    /// Interprets the actor outputs against the agent's net energy.
    ///
    /// Surplus is charged by `charge_pct`, then shared, sold, or stored up to
    /// 90 %. A deficit is drawn from the battery first and the remainder
    /// requested. When no output applies the rule cascade decides.
    fn decide(&self, agent: &Agent, ctx: &DecisionContext) -> Decision {
        let id = agent.id;
        let [charge_raw, share_raw, sell_raw] = self.forward(&Self::state_vector(agent, ctx));
        let charge_pct = charge_raw.clamp(0.0, 1.0);
        let share_kwh = share_raw.max(0.0);
        let sell_kwh = sell_raw.max(0.0);

        let capacity = agent.battery_capacity_kwh;
        let mut level = agent.battery_level_kwh;
        let mut net = agent.net_energy();

        if net > 0.0 {
            let mut charged = 0.0;
            if charge_pct > CHARGE_PCT_THRESHOLD {
                charged = (net * charge_pct).min(capacity - level).max(0.0);
                level += charged;
                net -= charged;
            }

            if share_kwh > SHARE_AMOUNT_THRESHOLD
                && net > 0.0
                && let Some(neighbor) = ctx.first_needy_neighbor()
            {
                let amount = share_kwh.min(net).min(neighbor.needs_kwh);
                return Decision::share(id, neighbor.id, amount).with_battery_delta(charged);
            }

            if sell_kwh > SELL_AMOUNT_THRESHOLD && net > 0.0 {
                return Decision::report(id, Action::SellToGrid, sell_kwh.min(net))
                    .with_battery_delta(charged);
            }

            let charge_target = CHARGE_TARGET_FRACTION * capacity;
            if level < charge_target {
                return Decision::charge(id, charged + net.min(charge_target - level));
            }
            if charged > 0.0 {
                return Decision::charge(id, charged);
            }
        } else if net < 0.0 {
            let drawn = (-net).min(level.max(0.0));
            return Decision::report(id, Action::RequestEnergy, -net - drawn)
                .with_battery_delta(-drawn);
        }

        RuleBasedPolicy.decide(agent, ctx)
    }

    fn name(&self) -> &'static str {
        "learned"
    }
}

/// Policy chosen at construction, dispatched statically.
#[derive(Debug, Clone)]
pub enum Policy {
    /// [`RuleBasedPolicy`].
    RuleBased(RuleBasedPolicy),
    /// [`LearnedPolicy`].
    Learned(LearnedPolicy),
}

impl Default for Policy {
    fn default() -> Self {
        Self::RuleBased(RuleBasedPolicy)
    }
}

impl AgentPolicy for Policy {
    fn decide(&self, agent: &Agent, ctx: &DecisionContext) -> Decision {
        match self {
            Self::RuleBased(p) => p.decide(agent, ctx),
            Self::Learned(p) => p.decide(agent, ctx),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::RuleBased(p) => p.name(),
            Self::Learned(p) => p.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::NeighborState;

    fn agent(production: f32, consumption: f32, level: f32) -> Agent {
        let mut a = Agent::new(0, 10.0);
        a.update_state(production, consumption);
        a.battery_level_kwh = level;
        a
    }

    fn zero() -> LearnedPolicy {
        LearnedPolicy {
            weights: [[0.0; STATE_DIM]; ACTION_DIM],
            bias: [0.0; ACTION_DIM],
        }
    }

    fn with_bias(bias: [f32; ACTION_DIM]) -> LearnedPolicy {
        LearnedPolicy { bias, ..zero() }
    }

    fn needy(id: usize, needs_kwh: f32) -> NeighborState {
        NeighborState {
            id,
            needs_kwh,
            battery_fraction: 0.2,
        }
    }

    #[test]
    fn rule_cascade_always_returns_known_action() {
        let ctx = DecisionContext::new(12).with_neighbors(vec![needy(1, 2.0)]);
        for production in [0.0, 1.0, 3.0, 6.0, 9.0] {
            for consumption in [0.0, 0.5, 2.0, 4.0] {
                for level in [0.0, 2.0, 5.0, 8.0, 10.0] {
                    let d = RuleBasedPolicy.decide(&agent(production, consumption, level), &ctx);
                    assert!(Action::ALL.contains(&d.action));
                    assert!(d.amount_kwh >= 0.0);
                }
            }
        }
    }

    #[test]
    fn state_vector_is_normalized() {
        let a = agent(15.0, 2.0, 4.0);
        let bright = NeighborState {
            id: 2,
            needs_kwh: 0.0,
            battery_fraction: 0.6,
        };
        let ctx = DecisionContext::new(6).with_neighbors(vec![needy(1, 0.0), bright]);
        let s = LearnedPolicy::state_vector(&a, &ctx);
        assert_eq!(s[0], 0.4);
        assert_eq!(s[1], 1.0);
        assert!((s[2] - 0.2).abs() < 1e-6);
        assert_eq!(s[3], 0.25);
        assert!((s[4] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn forward_is_affine() {
        let mut p = with_bias([0.5, 1.0, -1.0]);
        p.weights[0][0] = 2.0;
        let out = p.forward(&[0.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(out, [1.5, 1.0, -1.0]);
    }

    #[test]
    fn learned_charges_then_shares() {
        let p = with_bias([0.5, 3.0, 0.0]);
        let a = agent(5.0, 1.0, 5.0);
        let ctx = DecisionContext::new(12).with_neighbors(vec![needy(1, 0.0), needy(2, 1.0)]);
        let d = p.decide(&a, &ctx);
        assert_eq!(d.action, Action::ShareEnergy);
        assert_eq!(d.target, Some(2));
        assert_eq!(d.amount_kwh, 1.0);
        assert_eq!(d.battery_delta_kwh, 2.0);
    }

    #[test]
    fn learned_sells_when_no_neighbor_needs() {
        let p = with_bias([0.0, 3.0, 2.0]);
        let d = p.decide(&agent(5.0, 1.0, 5.0), &DecisionContext::new(12));
        assert_eq!(d.action, Action::SellToGrid);
        assert_eq!(d.amount_kwh, 2.0);
        assert_eq!(d.battery_delta_kwh, 0.0);
    }

    #[test]
    fn learned_stores_up_to_ninety_percent() {
        let d = zero().decide(&agent(5.0, 1.0, 7.0), &DecisionContext::new(12));
        assert_eq!(d.action, Action::ChargeBattery);
        assert!((d.amount_kwh - 2.0).abs() < 1e-6);
        assert_eq!(d.battery_delta_kwh, d.amount_kwh);
    }

    #[test]
    fn learned_deficit_draws_battery_first() {
        let d = zero().decide(&agent(0.0, 3.0, 1.0), &DecisionContext::new(22));
        assert_eq!(d.action, Action::RequestEnergy);
        assert_eq!(d.amount_kwh, 2.0);
        assert_eq!(d.battery_delta_kwh, -1.0);

        let d = zero().decide(&agent(0.0, 3.0, 6.0), &DecisionContext::new(22));
        assert_eq!(d.amount_kwh, 0.0);
        assert_eq!(d.battery_delta_kwh, -3.0);
    }

    #[test]
    fn learned_defers_to_rules_when_nothing_applies() {
        let a = agent(3.0, 3.0, 9.5);
        let ctx = DecisionContext::new(12);
        assert_eq!(zero().decide(&a, &ctx), RuleBasedPolicy.decide(&a, &ctx));
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let missing = std::env::temp_dir().join("solar_swarm_missing_weights.toml");
        let _ = std::fs::remove_file(&missing);
        assert!(matches!(
            LearnedPolicy::load(&missing),
            Err(SwarmError::PolicyLoad { .. })
        ));

        let bad = std::env::temp_dir().join(format!("solar_swarm_bad_weights_{}.toml", std::process::id()));
        std::fs::write(&bad, "weights = [[1.0]]\n").unwrap();
        assert!(matches!(
            LearnedPolicy::load(&bad),
            Err(SwarmError::PolicyParse { .. })
        ));
        let _ = std::fs::remove_file(&bad);
    }

    #[test]
    fn load_reads_weights() {
        let path = std::env::temp_dir().join(format!("solar_swarm_weights_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "weights = [[1.0, 0.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0, 0.0]]\nbias = [0.1, 0.2, 0.3]\n",
        )
        .unwrap();
        let p = LearnedPolicy::load(&path).unwrap();
        assert_eq!(p.weights[1][1], 1.0);
        assert_eq!(p.bias, [0.1, 0.2, 0.3]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn policy_enum_dispatches() {
        let a = agent(1.0, 4.0, 5.0);
        let ctx = DecisionContext::new(20);
        assert_eq!(Policy::default().name(), "rule_based");
        assert_eq!(Policy::Learned(zero()).name(), "learned");
        assert_eq!(
            Policy::default().decide(&a, &ctx),
            RuleBasedPolicy.decide(&a, &ctx)
        );
    }
}
