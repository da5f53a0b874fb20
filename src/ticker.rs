//! Tick drivers - realtime and stepping
//!
//! The clock expects exactly one tick source. Both drivers here
//! alternate draining the voice pool and ticking, so every voice
//! observes every boundary and no voice ever runs concurrently with a
//! tick.
//!
//! - Realtime: spin_sleep between subdivisions, with time dilation
//! - Stepping: advance by explicit beat deltas, for tests and offline
//!   rendering

use crate::clock::Clock;
use crate::voices::VoicePool;
use spin_sleep::SpinSleeper;
use std::rc::Rc;
use std::time::Duration;

/// Configuration for the realtime loop.
#[derive(Clone, Debug)]
pub struct TickerConfig {
    /// Quarter-note tempo.
    pub bpm: f64,
    /// Tick subdivision per beat. 24 matches MIDI clock resolution.
    pub ticks_per_beat: u32,
    /// Time dilation: 2.0 runs twice as fast as wall time.
    pub rate: f64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            ticks_per_beat: 24,
            rate: 1.0,
        }
    }
}

/// Drives a clock from a single source.
pub struct Ticker {
    clock: Clock,
    voices: Rc<VoicePool>,
    config: TickerConfig,
    sleeper: SpinSleeper,
}

impl Ticker {
    pub fn new(clock: Clock, voices: Rc<VoicePool>, config: TickerConfig) -> Self {
        Self {
            clock,
            voices,
            config,
            sleeper: SpinSleeper::default(),
        }
    }

    /// Beat delta of one subdivision.
    fn delta_beats(&self) -> f64 {
        1.0 / self.config.ticks_per_beat.max(1) as f64
    }

    /// Wall-clock length of one subdivision under the current dilation.
    fn tick_interval(&self) -> Duration {
        let bpm = if self.config.bpm.is_finite() && self.config.bpm > 0.0 {
            self.config.bpm
        } else {
            120.0
        };
        let rate = if self.config.rate.is_finite() && self.config.rate > 0.0 {
            self.config.rate
        } else {
            1.0
        };
        let secs = 60.0 / (bpm * self.config.ticks_per_beat.max(1) as f64 * rate);
        Duration::from_secs_f64(secs)
    }

    /// Advance by one explicit delta: drain voices, tick, drain again.
    pub fn step(&self, delta_beats: f64) {
        self.voices.run_until_idle();
        self.clock.tick(delta_beats);
        self.voices.run_until_idle();
    }

    /// Repeated [`Ticker::step`] with the same delta.
    pub fn step_n(&self, count: u32, delta_beats: f64) {
        for _ in 0..count {
            self.step(delta_beats);
        }
    }

    /// Step at the configured subdivision until the measure counter has
    /// advanced by `measures`. Bails out if the clock is stopped, which
    /// would otherwise never roll over again.
    pub fn step_measures(&self, measures: u64) {
        let end = self.clock.measure() + measures;
        while self.clock.measure() < end {
            if !self.clock.is_running() {
                break;
            }
            self.step(self.delta_beats());
        }
    }

    /// Realtime loop: tick one subdivision per interval until `done`.
    pub fn run_until<F>(&self, done: F)
    where
        F: Fn() -> bool,
    {
        loop {
            self.voices.run_until_idle();
            if done() {
                break;
            }
            self.sleeper.sleep(self.tick_interval());
            self.clock.tick(self.delta_beats());
        }
    }

    /// Realtime loop for a span of measures.
    pub fn run_for_measures(&self, measures: u64) {
        let end = self.clock.measure() + measures;
        self.run_until(|| self.clock.measure() >= end);
    }
}
