//! Measure-boundary synchronization and looping for voices.
//!
//! Voices realign at measure boundaries by parking on the clock's
//! measure event. The looping combinators run a body once per measure,
//! either on the calling voice or on a freshly spawned one.

use crate::clock::{Clock, NEW_MEASURE};
use crate::error::ConductorError;
use crate::signature::TimeSignature;

impl Clock {
    /// Park the calling voice until the next measure rollover.
    ///
    /// If `next` is given, that meter becomes active immediately on
    /// wake, so the new measure plays under it. When several voices
    /// queue different meters on the same boundary, the last to wake
    /// wins; wake order is unspecified.
    ///
    /// Returns the clock handle again so boundary-to-boundary calls
    /// chain. There is no timeout: against a clock that is stopped and
    /// never restarted, this never returns.
    pub async fn sync_to_measure(&self, next: Option<TimeSignature>) -> Clock {
        let wait = self.barrier().wait(NEW_MEASURE);
        wait.await;
        if let Some(signature) = next {
            self.set_time_signature(signature);
        }
        self.clone()
    }

    /// Run `body` once per measure for `measures` measures, on the
    /// calling voice.
    ///
    /// The first invocation happens immediately, without waiting for a
    /// boundary; each later one happens after the next rollover, and
    /// only if the measure counter has not already moved past the
    /// window (an irregular ticker can skip boundaries).
    pub async fn repeat_for_measures<F>(&self, measures: u64, mut body: F)
    where
        F: FnMut(),
    {
        if measures == 0 {
            return;
        }
        let end_measure = self.measure() + measures;
        body();
        for _ in 1..measures {
            self.sync_to_measure(None).await;
            if self.measure() < end_measure {
                body();
            }
        }
    }

    /// Spawn a voice running [`Clock::repeat_for_measures`] and return
    /// without waiting for any boundary.
    ///
    /// Fails if no voice pool was attached via
    /// [`Clock::attach_voices`].
    pub fn thread_for_measures<F>(&self, measures: u64, body: F) -> Result<(), ConductorError>
    where
        F: FnMut() + 'static,
    {
        let Some(voices) = self.voices() else {
            return Err(ConductorError::MissingCollaborator("voice pool"));
        };
        let clock = self.clone();
        voices.spawn(async move {
            clock.repeat_for_measures(measures, body).await;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voices::VoicePool;
    use std::cell::Cell;
    use std::rc::Rc;

    fn clock_with_pool() -> (Clock, Rc<VoicePool>) {
        let clock = Clock::new();
        let pool = Rc::new(VoicePool::new());
        clock.attach_voices(pool.clone());
        (clock, pool)
    }

    #[test]
    fn test_sync_wakes_on_rollover() {
        let (clock, pool) = clock_with_pool();
        clock.run();

        let woke = Rc::new(Cell::new(false));
        let c = clock.clone();
        let w = woke.clone();
        pool.spawn(async move {
            c.sync_to_measure(None).await;
            w.set(true);
        });

        pool.run_until_idle();
        assert!(!woke.get());

        clock.tick(4.0);
        pool.run_until_idle();
        assert!(woke.get());
    }

    #[test]
    fn test_sync_applies_queued_signature_on_wake() {
        let (clock, pool) = clock_with_pool();
        clock.run();

        let c = clock.clone();
        pool.spawn(async move {
            c.sync_to_measure(Some(TimeSignature::FiveEight)).await;
        });
        pool.run_until_idle();

        clock.tick(4.0);
        // The meter flips only once the waiting voice actually wakes.
        assert_eq!(clock.time_signature(), TimeSignature::FourFour);
        pool.run_until_idle();
        assert_eq!(clock.time_signature(), TimeSignature::FiveEight);
    }

    #[test]
    fn test_sync_chains() {
        let (clock, pool) = clock_with_pool();
        clock.run();

        let measures_seen = Rc::new(Cell::new(0u64));
        let c = clock.clone();
        let m = measures_seen.clone();
        pool.spawn(async move {
            let c = c.sync_to_measure(None).await;
            let c = c.sync_to_measure(None).await;
            m.set(c.measure());
        });

        pool.run_until_idle();
        clock.tick(4.0);
        pool.run_until_idle();
        clock.tick(4.0);
        pool.run_until_idle();
        assert_eq!(measures_seen.get(), 3);
    }

    #[test]
    fn test_repeat_zero_measures_is_noop() {
        let (clock, pool) = clock_with_pool();
        clock.run();

        let hits = Rc::new(Cell::new(0));
        let c = clock.clone();
        let h = hits.clone();
        pool.spawn(async move {
            c.repeat_for_measures(0, move || h.set(h.get() + 1)).await;
        });
        pool.run_until_idle();
        assert_eq!(hits.get(), 0);
        assert!(!pool.has_runnable());
    }

    #[test]
    fn test_thread_without_pool_fails() {
        let clock = Clock::new();
        let err = clock.thread_for_measures(2, || {}).unwrap_err();
        assert_eq!(err, ConductorError::MissingCollaborator("voice pool"));
    }
}
