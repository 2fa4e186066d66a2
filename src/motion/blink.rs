//! Autonomous eye-blink state machine.
//!
//! Open → Closing → Closed → Opening → Open, advanced by accumulated
//! `delta` rather than wall-clock timers. The open hold is jittered each
//! cycle so blinks do not look mechanical.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Expression the blink weight is written under.
pub const BLINK_EXPRESSION: &str = "blink";

/// Floor for phase durations so a zero-length config cannot spin forever.
const MIN_PHASE_SECS: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct BlinkConfig {
    /// Seconds to go from open to closed
    pub close_duration: f32,
    /// Seconds held fully closed
    pub closed_duration: f32,
    /// Seconds to go from closed back to open
    pub open_duration: f32,
    /// Minimum seconds the eyes stay open between blinks
    pub hold_min: f32,
    /// Random extra hold in `[0, hold_jitter)`
    pub hold_jitter: f32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            close_duration: 0.06,
            closed_duration: 0.06,
            open_duration: 0.06,
            hold_min: 3.0,
            hold_jitter: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Open,
    Closing,
    Closed,
    Opening,
}

impl BlinkPhase {
    fn next(self) -> Self {
        match self {
            BlinkPhase::Open => BlinkPhase::Closing,
            BlinkPhase::Closing => BlinkPhase::Closed,
            BlinkPhase::Closed => BlinkPhase::Opening,
            BlinkPhase::Opening => BlinkPhase::Open,
        }
    }
}

pub struct BlinkAutomaton {
    config: BlinkConfig,
    phase: BlinkPhase,
    elapsed: f32,
    duration: f32,
    enabled: bool,
    rng: StdRng,
}

impl BlinkAutomaton {
    pub fn new(config: BlinkConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic jitter for tests and replays.
    pub fn with_seed(config: BlinkConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: BlinkConfig, rng: StdRng) -> Self {
        let mut blink = Self {
            config,
            phase: BlinkPhase::Open,
            elapsed: 0.0,
            duration: 0.0,
            enabled: true,
            rng,
        };
        blink.duration = blink.phase_duration(BlinkPhase::Open);
        blink
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 0 = fully open, 1 = fully closed.
    pub fn weight(&self) -> f32 {
        let progress = (self.elapsed / self.duration).clamp(0.0, 1.0);
        match self.phase {
            BlinkPhase::Open => 0.0,
            BlinkPhase::Closing => progress,
            BlinkPhase::Closed => 1.0,
            BlinkPhase::Opening => 1.0 - progress,
        }
    }

    pub fn update(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        // Anything past one full cycle would only replay whole blinks.
        self.elapsed = (self.elapsed + delta).min(self.duration + self.max_cycle());

        while self.elapsed >= self.duration {
            if self.phase == BlinkPhase::Open && !self.enabled {
                // Suppressed: hold open, never start a new blink.
                self.elapsed = self.duration;
                return;
            }
            self.elapsed -= self.duration;
            self.enter(self.phase.next());
        }
    }

    /// Enable or suppress blinking.
    ///
    /// Returns the seconds until the eyes are fully open again, 0 when they
    /// already are. A blink in flight always runs to completion.
    pub fn set_enable(&mut self, enabled: bool) -> f32 {
        let resumed = enabled && !self.enabled;
        self.enabled = enabled;

        if resumed && self.phase == BlinkPhase::Open {
            self.enter(BlinkPhase::Open);
            self.elapsed = 0.0;
        }

        self.remaining_until_open()
    }

    pub fn remaining_until_open(&self) -> f32 {
        let left = (self.duration - self.elapsed).max(0.0);
        match self.phase {
            BlinkPhase::Open => 0.0,
            BlinkPhase::Closing => left + self.fixed(BlinkPhase::Closed) + self.fixed(BlinkPhase::Opening),
            BlinkPhase::Closed => left + self.fixed(BlinkPhase::Opening),
            BlinkPhase::Opening => left,
        }
    }

    /// Longest possible Open → Open cycle.
    fn max_cycle(&self) -> f32 {
        self.fixed(BlinkPhase::Closing)
            + self.fixed(BlinkPhase::Closed)
            + self.fixed(BlinkPhase::Opening)
            + self.fixed(BlinkPhase::Open)
            + self.config.hold_jitter.max(0.0)
    }

    fn enter(&mut self, phase: BlinkPhase) {
        self.phase = phase;
        self.duration = self.phase_duration(phase);
    }

    fn phase_duration(&mut self, phase: BlinkPhase) -> f32 {
        match phase {
            BlinkPhase::Open => {
                let jitter = if self.config.hold_jitter > 0.0 {
                    self.rng.gen_range(0.0..self.config.hold_jitter)
                } else {
                    0.0
                };
                (self.config.hold_min + jitter).max(MIN_PHASE_SECS)
            }
            other => self.fixed(other),
        }
    }

    fn fixed(&self, phase: BlinkPhase) -> f32 {
        let secs = match phase {
            BlinkPhase::Closing => self.config.close_duration,
            BlinkPhase::Closed => self.config.closed_duration,
            BlinkPhase::Opening => self.config.open_duration,
            BlinkPhase::Open => self.config.hold_min,
        };
        secs.max(MIN_PHASE_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_config() -> BlinkConfig {
        BlinkConfig {
            close_duration: 0.1,
            closed_duration: 0.05,
            open_duration: 0.1,
            hold_min: 1.0,
            hold_jitter: 0.0,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_full_cycle() {
        let mut blink = BlinkAutomaton::with_seed(fixed_config(), 1);
        assert_eq!(blink.phase(), BlinkPhase::Open);
        assert_eq!(blink.weight(), 0.0);

        blink.update(1.0);
        assert_eq!(blink.phase(), BlinkPhase::Closing);

        blink.update(0.05);
        assert!(approx(blink.weight(), 0.5));

        blink.update(0.06);
        assert_eq!(blink.phase(), BlinkPhase::Closed);
        assert_eq!(blink.weight(), 1.0);

        blink.update(0.05);
        assert_eq!(blink.phase(), BlinkPhase::Opening);

        blink.update(0.1);
        assert_eq!(blink.phase(), BlinkPhase::Open);
        assert_eq!(blink.weight(), 0.0);
    }

    #[test]
    fn test_large_delta_spans_phases() {
        let mut blink = BlinkAutomaton::with_seed(fixed_config(), 1);
        // hold 1.0 + close 0.1 + part of closed
        blink.update(1.12);
        assert_eq!(blink.phase(), BlinkPhase::Closed);
    }

    #[test]
    fn test_remaining_until_open() {
        let mut blink = BlinkAutomaton::with_seed(fixed_config(), 1);
        assert_eq!(blink.set_enable(false), 0.0);
        blink.set_enable(true);

        blink.update(1.0);
        blink.update(0.05);
        // rest of closing 0.05 + closed 0.05 + opening 0.1
        assert!(approx(blink.set_enable(false), 0.2));
    }

    #[test]
    fn test_suppressed_finishes_blink_then_holds_open() {
        let mut blink = BlinkAutomaton::with_seed(fixed_config(), 1);
        blink.update(1.02);
        assert_eq!(blink.phase(), BlinkPhase::Closing);

        blink.set_enable(false);
        blink.update(0.3);
        assert_eq!(blink.phase(), BlinkPhase::Open);

        for _ in 0..100 {
            blink.update(0.5);
            assert_eq!(blink.phase(), BlinkPhase::Open);
            assert_eq!(blink.weight(), 0.0);
        }
    }

    #[test]
    fn test_reenable_resumes_from_open() {
        let mut blink = BlinkAutomaton::with_seed(fixed_config(), 1);
        blink.set_enable(false);
        blink.update(5.0);
        assert_eq!(blink.set_enable(true), 0.0);

        blink.update(0.9);
        assert_eq!(blink.phase(), BlinkPhase::Open);
        blink.update(0.2);
        assert_eq!(blink.phase(), BlinkPhase::Closing);
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let config = BlinkConfig {
            hold_min: 2.0,
            hold_jitter: 1.5,
            ..fixed_config()
        };
        let mut blink = BlinkAutomaton::with_seed(config, 42);
        for _ in 0..20 {
            let mut held = 0.0;
            while blink.phase() == BlinkPhase::Open {
                blink.update(0.01);
                held += 0.01;
            }
            assert!(held >= 1.99 && held < 3.52, "held {}", held);
            while blink.phase() != BlinkPhase::Open {
                blink.update(0.01);
            }
        }
    }

    #[test]
    fn test_huge_or_non_finite_delta_returns() {
        let mut blink = BlinkAutomaton::with_seed(BlinkConfig::default(), 1);
        blink.update(1.0e9);
        assert!((0.0..=1.0).contains(&blink.weight()));

        blink.update(f32::INFINITY);
        blink.update(f32::NAN);
        blink.update(-3.0);
        assert!((0.0..=1.0).contains(&blink.weight()));

        // Still cycles normally afterwards.
        let mut seen_closed = false;
        for _ in 0..600 {
            blink.update(1.0 / 60.0);
            seen_closed |= blink.phase() == BlinkPhase::Closed;
        }
        assert!(seen_closed);
    }

    #[test]
    fn test_same_seed_same_timing() {
        let mut a = BlinkAutomaton::with_seed(BlinkConfig::default(), 7);
        let mut b = BlinkAutomaton::with_seed(BlinkConfig::default(), 7);
        for _ in 0..2000 {
            a.update(1.0 / 60.0);
            b.update(1.0 / 60.0);
            assert_eq!(a.phase(), b.phase());
        }
    }
}
