//! Deferred transitions
//!
//! Fire-and-forget timers driven by simulation time. Each scheduled action
//! gets a handle so it can be cancelled before it fires; `cancel_all` drops
//! everything when a session is superseded.

/// Identifies one scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Pending<A> {
    handle: TimerHandle,
    remaining: f32,
    action: A,
}

/// Queue of actions waiting for simulated time to pass
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    pending: Vec<Pending<A>>,
    next_id: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Run `action` once `delay` seconds of simulated time have passed
    pub fn schedule(&mut self, delay: f32, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            remaining: delay.max(0.0),
            action,
        });
        handle
    }

    /// Cancel one action. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Drop every pending action, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance time by `dt` seconds and return the actions that came due,
    /// earliest first (ties in scheduling order)
    pub fn advance(&mut self, dt: f32) -> Vec<A> {
        for p in &mut self.pending {
            p.remaining -= dt;
        }

        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.remaining <= 0.0);
        self.pending = waiting;

        due.sort_by(|a, b| {
            a.remaining
                .partial_cmp(&b.remaining)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.handle.0.cmp(&b.handle.0))
        });
        due.into_iter().map(|p| p.action).collect()
    }
}
