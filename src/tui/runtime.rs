//! Simulation driver and TUI application state.

use std::collections::VecDeque;
use std::time::Instant;

use crate::config::ScenarioConfig;
use crate::error::SwarmError;
use crate::sim::{StepReport, SwarmSimulator};

/// Maximum number of history entries kept for the rolling chart.
const MAX_HISTORY: usize = 200;

/// Tick interval options in milliseconds (slowest → fastest).
const SPEED_LEVELS_MS: [u64; 6] = [500, 250, 100, 50, 20, 5];

/// Default speed index (100 ms).
const DEFAULT_SPEED_IDX: usize = 2;

/// Speed level closest to a configured tick delay.
fn speed_idx_for(delay_ms: u64) -> usize {
    if delay_ms == 0 {
        return DEFAULT_SPEED_IDX;
    }
    SPEED_LEVELS_MS
        .iter()
        .enumerate()
        .min_by_key(|(_, ms)| ms.abs_diff(delay_ms))
        .map_or(DEFAULT_SPEED_IDX, |(i, _)| i)
}

/// TUI application state.
pub struct App {
    sim: SwarmSimulator,
    /// Current scenario (kept for restart/preset switch).
    scenario: ScenarioConfig,
    /// Rolling history of step reports for the chart.
    pub history: VecDeque<StepReport>,
    /// Next hour to simulate.
    pub hour: usize,
    /// Total hours in the run.
    pub total_hours: usize,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    pub last_tick: Instant,
    /// Name of the active preset, or `"custom"` for a scenario file.
    pub preset_name: String,
    /// Last preset switch failure, shown in the footer.
    pub notice: Option<String>,
}

impl App {
    /// Creates a new app from a validated scenario.
    ///
    /// # Errors
    ///
    /// Fails when the simulator cannot be built from `scenario`.
    pub fn new(scenario: ScenarioConfig) -> Result<Self, SwarmError> {
        let preset_name = ScenarioConfig::PRESETS
            .iter()
            .find(|name| {
                ScenarioConfig::from_preset(name)
                    .is_ok_and(|p| p.scenario == scenario.scenario && p.policy == scenario.policy)
            })
            .map_or("custom", |name| *name)
            .to_string();
        let sim = scenario.build()?;
        Ok(Self {
            sim,
            total_hours: scenario.simulation.hours,
            speed_idx: speed_idx_for(scenario.simulation.tick_delay_ms),
            scenario,
            history: VecDeque::with_capacity(MAX_HISTORY),
            hour: 0,
            paused: false,
            quit: false,
            last_tick: Instant::now(),
            preset_name,
            notice: None,
        })
    }

    /// Advances the simulation by one hour if not finished.
    pub fn tick(&mut self) {
        if self.is_finished() {
            return;
        }
        let report = self.sim.step(self.hour);
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(report);
        self.hour += 1;
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Increases simulation speed (shorter tick interval).
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
    }

    /// Decreases simulation speed (longer tick interval).
    pub fn speed_down(&mut self) {
        if self.speed_idx > 0 {
            self.speed_idx -= 1;
        }
    }

    /// Returns the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        SPEED_LEVELS_MS[self.speed_idx]
    }

    /// Switches to a preset, keeping the current size, length and seed.
    pub fn switch_preset(&mut self, name: &str) {
        let Ok(mut scenario) = ScenarioConfig::from_preset(name) else {
            return;
        };
        scenario.simulation = self.scenario.simulation.clone();
        self.reset(scenario, name);
    }

    /// Restarts the current scenario from hour zero.
    pub fn restart(&mut self) {
        let name = self.preset_name.clone();
        self.reset(self.scenario.clone(), &name);
    }

    fn reset(&mut self, scenario: ScenarioConfig, name: &str) {
        match scenario.build() {
            Ok(sim) => {
                self.sim = sim;
                self.total_hours = scenario.simulation.hours;
                self.scenario = scenario;
                self.history.clear();
                self.hour = 0;
                self.paused = false;
                self.preset_name = name.to_string();
                self.notice = None;
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    /// Mean battery level as a fraction, from the latest tick or the initial half charge.
    pub fn avg_battery(&self) -> f32 {
        self.history.back().map_or(0.5, |r| r.avg_battery / 100.0)
    }

    /// Returns `true` when every hour has been simulated.
    pub fn is_finished(&self) -> bool {
        self.hour >= self.total_hours
    }

    /// Returns the most recent step report, if any.
    pub fn last_report(&self) -> Option<&StepReport> {
        self.history.back()
    }

    /// Energy shared over the visible history (kWh).
    pub fn shared_in_history(&self) -> f32 {
        self.history.iter().map(|r| r.total_shared).sum()
    }

    /// Number of households in the run.
    pub fn agent_count(&self) -> usize {
        self.sim.agents().len()
    }

    /// Name of the decision policy in use.
    pub fn policy_name(&self) -> &'static str {
        use crate::agent::AgentPolicy;
        self.sim.policy().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(preset: &str) -> App {
        App::new(ScenarioConfig::from_preset(preset).unwrap()).unwrap()
    }

    #[test]
    fn app_creates_and_ticks() {
        let mut app = app("baseline");
        assert_eq!(app.hour, 0);
        assert!(!app.is_finished());
        assert_eq!(app.preset_name, "baseline");

        app.tick();
        assert_eq!(app.hour, 1);
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn app_finishes_after_total_hours() {
        let mut app = app("baseline");
        for _ in 0..app.total_hours {
            app.tick();
        }
        assert!(app.is_finished());
        let before = app.hour;
        app.tick();
        assert_eq!(app.hour, before);
    }

    #[test]
    fn speed_controls_stay_in_bounds() {
        let mut app = app("baseline");
        for _ in 0..10 {
            app.speed_down();
        }
        assert_eq!(app.speed_idx, 0);
        for _ in 0..10 {
            app.speed_up();
        }
        assert_eq!(app.speed_idx, SPEED_LEVELS_MS.len() - 1);
    }

    #[test]
    fn tick_delay_picks_nearest_speed() {
        assert_eq!(speed_idx_for(0), DEFAULT_SPEED_IDX);
        assert_eq!(speed_idx_for(1000), 0);
        assert_eq!(speed_idx_for(45), 3);
    }

    #[test]
    fn switch_preset_resets_state() {
        let mut app = app("baseline");
        app.tick();
        app.tick();
        app.switch_preset("heatwave");
        assert_eq!(app.hour, 0);
        assert!(app.history.is_empty());
        assert_eq!(app.preset_name, "heatwave");
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let mut app = app("baseline");
        app.tick();
        app.switch_preset("nope");
        assert_eq!(app.hour, 1);
        assert_eq!(app.preset_name, "baseline");
    }

    #[test]
    fn restart_resets_state() {
        let mut app = app("peak_demand");
        for _ in 0..5 {
            app.tick();
        }
        app.restart();
        assert_eq!(app.hour, 0);
        assert!(app.history.is_empty());
        assert_eq!(app.preset_name, "peak_demand");
    }

    #[test]
    fn history_caps_at_max() {
        let mut scenario = ScenarioConfig::baseline();
        scenario.simulation.hours = MAX_HISTORY + 10;
        let mut app = App::new(scenario).unwrap();
        for _ in 0..app.total_hours {
            app.tick();
        }
        assert_eq!(app.history.len(), MAX_HISTORY);
        assert_eq!(app.history.back().map(|r| r.hour), Some(MAX_HISTORY + 9));
    }
}
