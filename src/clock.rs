//! Clock - shared measure/beat state machine
//!
//! One clock instance is shared by every voice in a piece. An external
//! ticker advances it in beat increments; when the beat counter passes
//! the end of the current measure the clock rolls over, publishes the
//! new measure number, and broadcasts the measure event that releases
//! everything parked in [`Clock::sync_to_measure`].
//!
//! The handle is `!Send`, so a single designated ticking thread is
//! enforced by construction; the clock itself carries no locking.

use crate::barrier::Barrier;
use crate::error::ConductorError;
use crate::publish::{NullSink, StatusEvent, StatusSink};
use crate::signature::TimeSignature;
use crate::voices::VoicePool;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Barrier event broadcast on every measure rollover.
pub const NEW_MEASURE: &str = "new-measure";

/// Whether the clock responds to ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

/// The clock's position and mode. Readable by any voice; mutated only
/// through [`Clock`] operations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockState {
    /// Current measure number, counted from 1.
    pub measure: u64,
    /// Beat position within the measure, in `[1, beats_per_measure + 1)`.
    pub beat: f64,
    /// The active meter.
    pub signature: TimeSignature,
    pub run_state: RunState,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            measure: 1,
            beat: 1.0,
            signature: TimeSignature::default(),
            run_state: RunState::default(),
        }
    }
}

struct ClockInner {
    state: ClockState,
    barrier: Barrier,
    sink: Rc<dyn StatusSink>,
    voices: Option<Rc<VoicePool>>,
}

/// A cloneable handle to the shared clock. All clones see one state.
#[derive(Clone)]
pub struct Clock(Rc<RefCell<ClockInner>>);

impl Clock {
    /// A clock with no observer attached.
    pub fn new() -> Self {
        Self::with_sink(Rc::new(NullSink))
    }

    /// A clock publishing state changes to `sink`.
    pub fn with_sink(sink: Rc<dyn StatusSink>) -> Self {
        let clock = Clock(Rc::new(RefCell::new(ClockInner {
            state: ClockState::default(),
            barrier: Barrier::new(),
            sink,
            voices: None,
        })));
        // Observers see the starting position immediately.
        clock.reset();
        clock
    }

    /// Attach the pool that [`Clock::thread_for_measures`] spawns onto.
    pub fn attach_voices(&self, voices: Rc<VoicePool>) {
        self.0.borrow_mut().voices = Some(voices);
    }

    /// Start responding to ticks and release anything already parked at
    /// the measure boundary, so playback begins without a first tick.
    pub fn run(&self) {
        self.0.borrow_mut().state.run_state = RunState::Running;
        self.publish(StatusEvent::Run(RunState::Running));
        self.barrier().broadcast(NEW_MEASURE);
    }

    /// Stop responding to ticks. Voices parked at the boundary stay
    /// parked: this is a pause, not a cancellation. They release on the
    /// broadcast from a later [`Clock::run`].
    pub fn stop(&self) {
        self.0.borrow_mut().state.run_state = RunState::Stopped;
        self.publish(StatusEvent::Run(RunState::Stopped));
    }

    /// Advance the beat counter. No-op while stopped or for a
    /// non-positive delta.
    ///
    /// A tick that pushes the beat past the end of the measure rolls
    /// over: beat snaps back to 1, the measure count goes up by exactly
    /// one (an overshoot larger than a whole measure does not
    /// fast-forward), the new measure is published, and the measure
    /// event is broadcast.
    pub fn tick(&self, delta_beats: f64) {
        if !(delta_beats.is_finite() && delta_beats > 0.0) {
            return;
        }
        let rolled = {
            let mut inner = self.0.borrow_mut();
            if inner.state.run_state != RunState::Running {
                return;
            }
            inner.state.beat += delta_beats;
            if inner.state.beat >= inner.state.signature.beats_per_measure() + 1.0 {
                inner.state.beat = 1.0;
                inner.state.measure += 1;
                Some(inner.state.measure)
            } else {
                None
            }
        };
        match rolled {
            Some(measure) => {
                self.publish(StatusEvent::Measure(measure));
                self.barrier().broadcast(NEW_MEASURE);
            }
            None => {
                let beat = self.0.borrow().state.beat;
                self.publish(StatusEvent::Beat(beat));
            }
        }
    }

    /// Switch the active meter immediately, wherever the beat counter
    /// sits. A mid-measure switch changes the effective length of the
    /// measure in progress; callers who care switch at a boundary via
    /// [`Clock::sync_to_measure`].
    pub fn set_time_signature(&self, signature: TimeSignature) {
        self.0.borrow_mut().state.signature = signature;
        self.publish(StatusEvent::Signature(signature));
    }

    /// Switch the active meter by symbolic id. An unknown id is
    /// rejected and the active meter is left untouched.
    pub fn set_named_signature(&self, id: &str) -> Result<(), ConductorError> {
        let signature: TimeSignature = id.parse()?;
        self.set_time_signature(signature);
        Ok(())
    }

    /// Republish the starting position for external observers. The
    /// internal counters stay where they are; this resets what the
    /// outside world displays, it does not rewind the piece.
    pub fn reset(&self) {
        self.publish(StatusEvent::Measure(1));
        self.publish(StatusEvent::Beat(1.0));
    }

    pub fn measure(&self) -> u64 {
        self.0.borrow().state.measure
    }

    pub fn beat(&self) -> f64 {
        self.0.borrow().state.beat
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.0.borrow().state.signature
    }

    pub fn run_state(&self) -> RunState {
        self.0.borrow().state.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state() == RunState::Running
    }

    /// Copy of the full state, for observability.
    pub fn snapshot(&self) -> ClockState {
        self.0.borrow().state
    }

    /// The barrier this clock broadcasts on.
    pub fn barrier(&self) -> Barrier {
        self.0.borrow().barrier.clone()
    }

    pub(crate) fn voices(&self) -> Option<Rc<VoicePool>> {
        self.0.borrow().voices.clone()
    }

    // Publishing happens outside the state borrow so a sink may read
    // the clock back.
    fn publish(&self, event: StatusEvent) {
        let sink = self.0.borrow().sink.clone();
        sink.publish(event);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
