//! Barrier - named broadcast/wait synchronization
//!
//! A barrier lets any number of voices park on an event name and be
//! released together by the next broadcast of that name. Broadcasts are
//! not buffered: a voice that starts waiting after a broadcast waits for
//! the following one, and a broadcast with no waiters is lost. No wake
//! order is guaranteed among waiters released together.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Shared wait cell between a future and whoever resolves it.
#[derive(Clone, Default)]
pub struct WaitState {
    inner: Rc<RefCell<WaitStateInner>>,
}

#[derive(Default)]
struct WaitStateInner {
    done: bool,
    waker: Option<Waker>,
}

impl WaitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_waker(&self, w: &Waker) {
        self.inner.borrow_mut().waker = Some(w.clone());
    }

    pub fn complete(&self) {
        let mut s = self.inner.borrow_mut();
        if s.done {
            return;
        }
        s.done = true;
        if let Some(w) = s.waker.take() {
            w.wake();
        }
    }

    pub fn is_done(&self) -> bool {
        self.inner.borrow().done
    }
}

/// Per-event waiter list.
#[derive(Default)]
struct EventState {
    /// Broadcasts seen so far on this event.
    broadcasts: u64,
    /// Waiters registered since the last broadcast.
    waiters: Vec<WaitState>,
}

/// A cloneable handle to a set of named events. Clones share state, so
/// one component can broadcast what another waits on.
#[derive(Clone, Default)]
pub struct Barrier {
    events: Rc<RefCell<HashMap<String, EventState>>>,
}

impl Barrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every voice currently waiting on `event`.
    pub fn broadcast(&self, event: &str) {
        let released = {
            let mut events = self.events.borrow_mut();
            let state = events.entry(event.to_string()).or_default();
            state.broadcasts += 1;
            std::mem::take(&mut state.waiters)
        };
        // Wake outside the map borrow: a released voice may re-register
        // on this same event before the next poll cycle settles.
        for waiter in released {
            waiter.complete();
        }
    }

    /// Park until the next broadcast of `event`. Registration happens on
    /// first poll, so a future created before a broadcast but polled
    /// after it waits for the broadcast after that.
    pub fn wait(&self, event: &str) -> BarrierWait {
        BarrierWait {
            barrier: self.clone(),
            event: event.to_string(),
            state: WaitState::new(),
            registered: false,
        }
    }

    /// Number of voices currently parked on `event`.
    pub fn waiting(&self, event: &str) -> usize {
        self.events
            .borrow()
            .get(event)
            .map(|s| s.waiters.len())
            .unwrap_or(0)
    }

    /// Broadcasts seen so far on `event`.
    pub fn broadcasts(&self, event: &str) -> u64 {
        self.events
            .borrow()
            .get(event)
            .map(|s| s.broadcasts)
            .unwrap_or(0)
    }
}

/// Future returned by [`Barrier::wait`].
pub struct BarrierWait {
    barrier: Barrier,
    event: String,
    state: WaitState,
    registered: bool,
}

impl Future for BarrierWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.state.is_done() {
            return Poll::Ready(());
        }

        this.state.set_waker(cx.waker());

        if !this.registered {
            this.barrier
                .events
                .borrow_mut()
                .entry(this.event.clone())
                .or_default()
                .waiters
                .push(this.state.clone());
            this.registered = true;
        }

        Poll::Pending
    }
}
