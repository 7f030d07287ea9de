use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::input::ContactBoard;
use super::touch::ContactSample;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    pub target_tps: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { target_tps: 60 }
    }
}

/// Anything advanced once per fixed tick with that tick's raw contacts.
pub trait Simulation {
    fn tick(&mut self, fixed_dt_seconds: f32, contacts: &[ContactSample]);
}

/// Headless fixed-step driver. Contacts persist on the board between ticks
/// until lifted, the way a finger stays down across frames.
#[derive(Debug)]
pub struct TickDriver {
    fixed_dt_seconds: f32,
    contacts: ContactBoard,
    ticks_run: u64,
}

impl TickDriver {
    pub fn new(config: &LoopConfig) -> Self {
        let target_tps = config.target_tps.max(1);
        let fixed_dt_seconds = 1.0 / target_tps as f32;
        info!(target_tps, fixed_dt_seconds, "loop_config");
        Self {
            fixed_dt_seconds,
            contacts: ContactBoard::default(),
            ticks_run: 0,
        }
    }

    pub fn fixed_dt_seconds(&self) -> f32 {
        self.fixed_dt_seconds
    }

    pub fn contacts(&self) -> &ContactBoard {
        &self.contacts
    }

    pub fn contacts_mut(&mut self) -> &mut ContactBoard {
        &mut self.contacts
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    pub fn step<S>(&mut self, simulation: &mut S)
    where
        S: Simulation + ?Sized,
    {
        let samples = self.contacts.samples();
        simulation.tick(self.fixed_dt_seconds, &samples);
        self.ticks_run = self.ticks_run.saturating_add(1);
    }

    pub fn run<S>(&mut self, simulation: &mut S, ticks: u32)
    where
        S: Simulation + ?Sized,
    {
        for _ in 0..ticks {
            self.step(simulation);
        }
        debug!(ticks, total = self.ticks_run, "ticks_advanced");
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::app::touch::TouchId;

    #[derive(Default)]
    struct CountingSim {
        ticks: u32,
        last_dt: f32,
        last_contact_count: usize,
    }

    impl Simulation for CountingSim {
        fn tick(&mut self, fixed_dt_seconds: f32, contacts: &[ContactSample]) {
            self.ticks += 1;
            self.last_dt = fixed_dt_seconds;
            self.last_contact_count = contacts.len();
        }
    }

    #[test]
    fn fixed_dt_follows_target_tps() {
        let driver = TickDriver::new(&LoopConfig { target_tps: 50 });
        assert!((driver.fixed_dt_seconds() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn zero_tps_is_clamped() {
        let driver = TickDriver::new(&LoopConfig { target_tps: 0 });
        assert!((driver.fixed_dt_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn run_advances_requested_tick_count_with_live_contacts() {
        let mut driver = TickDriver::new(&LoopConfig::default());
        let mut sim = CountingSim::default();
        driver.contacts_mut().press(TouchId(1), Vec2::new(1.0, 2.0));

        driver.run(&mut sim, 3);

        assert_eq!(sim.ticks, 3);
        assert_eq!(driver.ticks_run(), 3);
        assert_eq!(sim.last_contact_count, 1);
        assert!((sim.last_dt - 1.0 / 60.0).abs() < 1e-6);
    }
}
