//! Measure-aligned coordination for concurrent musical voices.
//!
//! A shared clock advances in beats under a switchable time signature,
//! driven by an externally supplied tick source. Voices park on a
//! broadcast barrier at measure boundaries and are released together on
//! rollover, which keeps independently written parts in lockstep
//! without a central scheduler owning their bodies.
//!
//! - Tick-driven: one designated source calls [`Clock::tick`]
//! - Measure barrier: [`Clock::sync_to_measure`] parks until rollover
//! - Looping: [`Clock::repeat_for_measures`] and
//!   [`Clock::thread_for_measures`] pace a body across measures
//! - Dual drivers: realtime (spin_sleep) and offline stepping for
//!   deterministic tests

pub mod barrier;
pub mod clock;
pub mod error;
mod measures;
pub mod publish;
pub mod signature;
pub mod ticker;
pub mod voices;


pub use barrier::Barrier;
pub use clock::{Clock, ClockState, RunState, NEW_MEASURE};
pub use error::ConductorError;
pub use publish::{MemorySink, NullSink, StatusEvent, StatusSink};
pub use signature::TimeSignature;
pub use ticker::{Ticker, TickerConfig};
pub use voices::VoicePool;
