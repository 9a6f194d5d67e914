use std::collections::{BTreeMap, HashMap};

/// Handle returned by [`TimerQueue::schedule`], used to cancel a pending timer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that reached its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent<T> {
    pub id: TimerId,
    pub deadline_ns: u64,
    pub payload: T,
}

/// One-shot timers ordered by guest-time deadline.
///
/// Timers sharing a deadline fire in scheduling order. Periodic behaviour is built by the owner
/// re-scheduling from its event handler.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: BTreeMap<(u64, TimerId), T>,
    deadlines: HashMap<TimerId, u64>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn schedule(&mut self, deadline_ns: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((deadline_ns, id), payload);
        self.deadlines.insert(id, deadline_ns);
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline_ns) => self.pending.remove(&(deadline_ns, id)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn deadline_ns(&self, id: TimerId) -> Option<u64> {
        self.deadlines.get(&id).copied()
    }

    pub fn next_deadline_ns(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(deadline_ns, _)| deadline_ns)
    }

    /// Remove and return the earliest timer whose deadline is `<= now_ns`.
    pub fn pop_due(&mut self, now_ns: u64) -> Option<TimerEvent<T>> {
        let &(deadline_ns, id) = self.pending.keys().next()?;
        if deadline_ns > now_ns {
            return None;
        }
        let payload = self.pending.remove(&(deadline_ns, id))?;
        self.deadlines.remove(&id);
        Some(TimerEvent {
            id,
            deadline_ns,
            payload,
        })
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::TimerQueue;

    #[test]
    fn timers_fire_in_deadline_then_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule(30, "c");
        q.schedule(10, "a");
        q.schedule(10, "b");

        assert_eq!(q.next_deadline_ns(), Some(10));
        assert!(q.pop_due(9).is_none());
        assert_eq!(q.pop_due(10).unwrap().payload, "a");
        assert_eq!(q.pop_due(10).unwrap().payload, "b");
        assert!(q.pop_due(29).is_none());
        let ev = q.pop_due(100).unwrap();
        assert_eq!((ev.deadline_ns, ev.payload), (30, "c"));
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let id = q.schedule(5, 1u32);
        q.schedule(6, 2u32);
        assert!(q.is_pending(id));
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(!q.is_pending(id));
        assert_eq!(q.pop_due(10).unwrap().payload, 2);
        assert!(q.pop_due(10).is_none());
    }
}
