//! Voice pool - single-threaded cooperative task execution
//!
//! Voices are async tasks polled in FIFO wake order, so a run of the
//! pool is reproducible. The pool never runs concurrently with the
//! ticker; drivers alternate draining the pool and ticking the clock,
//! which keeps the single-writer discipline on shared clock state.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

/// Lifecycle of a single voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VoiceStatus {
    /// Off the queue, waiting for a waker.
    Parked,
    /// Sitting in the ready queue.
    Queued,
    /// Finished; must never be polled again.
    Done,
}

struct Voice {
    body: RefCell<Pin<Box<dyn Future<Output = ()>>>>,
    status: Cell<VoiceStatus>,
    pool: Weak<RefCell<ReadyQueue>>,
}

type ReadyQueue = VecDeque<Rc<Voice>>;

/// Single-threaded deterministic executor for voices.
#[derive(Default)]
pub struct VoicePool {
    ready: Rc<RefCell<ReadyQueue>>,
}

impl VoicePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a voice. It runs on the next [`VoicePool::run_until_idle`].
    pub fn spawn(&self, body: impl Future<Output = ()> + 'static) {
        let voice = Rc::new(Voice {
            body: RefCell::new(Box::pin(body)),
            status: Cell::new(VoiceStatus::Queued),
            pool: Rc::downgrade(&self.ready),
        });
        self.ready.borrow_mut().push_back(voice);
    }

    /// Poll queued voices in FIFO order until none are runnable.
    /// Returns the number of polls performed.
    pub fn run_until_idle(&self) -> usize {
        let mut polls = 0;
        loop {
            let Some(voice) = self.ready.borrow_mut().pop_front() else {
                break;
            };

            // Stale queue entries: a wake can land after completion.
            if voice.status.get() == VoiceStatus::Done {
                continue;
            }
            voice.status.set(VoiceStatus::Parked);

            let waker = voice_waker(&voice);
            let mut cx = Context::from_waker(&waker);
            polls += 1;

            let poll = voice.body.borrow_mut().as_mut().poll(&mut cx);
            if let Poll::Ready(()) = poll {
                voice.status.set(VoiceStatus::Done);
            }
        }
        polls
    }

    /// Whether any voice is queued to run.
    pub fn has_runnable(&self) -> bool {
        !self.ready.borrow().is_empty()
    }
}

// A hand-rolled waker: `std::task::Wake` requires `Send + Sync`, which a
// single-threaded voice cannot satisfy.
fn voice_waker(voice: &Rc<Voice>) -> Waker {
    unsafe fn clone_raw(data: *const ()) -> RawWaker {
        let voice = Rc::<Voice>::from_raw(data as *const Voice);
        let cloned = voice.clone();
        std::mem::forget(voice);
        RawWaker::new(Rc::into_raw(cloned) as *const (), &VTABLE)
    }

    unsafe fn wake_raw(data: *const ()) {
        wake_by_ref_raw(data);
        drop_raw(data);
    }

    unsafe fn wake_by_ref_raw(data: *const ()) {
        let voice = Rc::<Voice>::from_raw(data as *const Voice);
        // Only a parked voice re-queues; queued and completed voices
        // ignore the wake.
        if voice.status.get() == VoiceStatus::Parked {
            if let Some(queue) = voice.pool.upgrade() {
                voice.status.set(VoiceStatus::Queued);
                queue.borrow_mut().push_back(voice.clone());
            }
        }
        std::mem::forget(voice);
    }

    unsafe fn drop_raw(data: *const ()) {
        drop(Rc::<Voice>::from_raw(data as *const Voice));
    }

    static VTABLE: RawWakerVTable =
        RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

    let raw = RawWaker::new(Rc::into_raw(voice.clone()) as *const (), &VTABLE);
    unsafe { Waker::from_raw(raw) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_spawn_and_run() {
        let pool = VoicePool::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        pool.spawn(async move {
            h.set(h.get() + 1);
        });

        assert!(pool.has_runnable());
        pool.run_until_idle();
        assert_eq!(hits.get(), 1);
        assert!(!pool.has_runnable());
    }

    #[test]
    fn test_fifo_spawn_order() {
        let pool = VoicePool::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let o = order.clone();
            pool.spawn(async move {
                o.borrow_mut().push(i);
            });
        }

        pool.run_until_idle();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parked_voice_resumes_on_wake() {
        let pool = VoicePool::new();
        let stage = Rc::new(Cell::new(0));
        let parked: Rc<RefCell<Option<Waker>>> = Rc::new(RefCell::new(None));

        let s = stage.clone();
        let p = parked.clone();
        pool.spawn(async move {
            std::future::poll_fn(|cx| {
                if s.get() == 0 {
                    *p.borrow_mut() = Some(cx.waker().clone());
                    s.set(1);
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            })
            .await;
            s.set(2);
        });

        pool.run_until_idle();
        assert_eq!(stage.get(), 1);

        let waker = parked.borrow_mut().take().unwrap();
        waker.wake();
        pool.run_until_idle();
        assert_eq!(stage.get(), 2);
    }

    #[test]
    fn test_stale_wake_after_completion_is_ignored() {
        let pool = VoicePool::new();
        let polls = Rc::new(Cell::new(0));
        let stashed: Rc<RefCell<Option<Waker>>> = Rc::new(RefCell::new(None));

        let c = polls.clone();
        let st = stashed.clone();
        pool.spawn(async move {
            std::future::poll_fn(|cx| {
                c.set(c.get() + 1);
                if c.get() == 1 {
                    *st.borrow_mut() = Some(cx.waker().clone());
                    // Self-wake: completes on the second poll.
                    cx.waker().wake_by_ref();
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            })
            .await;
        });

        pool.run_until_idle();
        assert_eq!(polls.get(), 2);

        // The stashed waker fires after the voice finished; the pool
        // must not poll the finished body again.
        let waker = stashed.borrow_mut().take().unwrap();
        waker.wake();
        pool.run_until_idle();
        assert_eq!(polls.get(), 2);
    }

    #[test]
    fn test_voice_can_spawn_voice() {
        let pool = Rc::new(VoicePool::new());
        let hits = Rc::new(Cell::new(0));

        let p = pool.clone();
        let h = hits.clone();
        pool.spawn(async move {
            let h2 = h.clone();
            p.spawn(async move {
                h2.set(h2.get() + 10);
            });
            h.set(h.get() + 1);
        });

        pool.run_until_idle();
        assert_eq!(hits.get(), 11);
    }
}
