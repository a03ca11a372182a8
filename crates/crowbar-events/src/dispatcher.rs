/// Handler priority levels, executed Highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerPriority {
    Highest = 0,
    FairlyHigh = 1,
    Default = 2,
    FairlyLow = 3,
    Lowest = 4,
}

pub type HandlerId = u64;

/// Handler IDs are process-unique so dispatchers can be taken apart and
/// merged without colliding registrations.
static NEXT_HANDLER_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

fn next_handler_id() -> HandlerId {
    NEXT_HANDLER_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

struct Entry<H> {
    id: HandlerId,
    priority: HandlerPriority,
    handler: H,
    /// Removed after its first invocation.
    once: bool,
    /// Tombstoned entries are skipped and swept after the active dispatch.
    dead: bool,
}

/// A priority-ordered list of handlers with three dispatch policies:
/// run-all, stop-at-false (filter chains) and stop-at-true (claims).
///
/// Removal during dispatch tombstones the entry so it takes effect once
/// the current dispatch completes; registration during dispatch lands in
/// a pending list merged at the same point.
pub struct EventDispatcher<H> {
    entries: Vec<Entry<H>>,
    pending: Vec<Entry<H>>,
    depth: u32,
}

impl<H> EventDispatcher<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            pending: Vec::new(),
            depth: 0,
        }
    }

    pub fn register(&mut self, priority: HandlerPriority, handler: H) -> HandlerId {
        self.insert(priority, handler, false)
    }

    /// Register a handler that is removed after its first invocation.
    pub fn register_once(&mut self, priority: HandlerPriority, handler: H) -> HandlerId {
        self.insert(priority, handler, true)
    }

    fn insert(&mut self, priority: HandlerPriority, handler: H, once: bool) -> HandlerId {
        let id = next_handler_id();
        let entry = Entry {
            id,
            priority,
            handler,
            once,
            dead: false,
        };
        if self.depth > 0 {
            self.pending.push(entry);
        } else {
            self.entries.push(entry);
            self.entries.sort_by_key(|e| e.priority);
        }
        id
    }

    /// Remove a handler. During dispatch the removal is deferred until the
    /// dispatch completes.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id && !e.dead) {
            entry.dead = true;
            if self.depth == 0 {
                self.sweep();
            }
            return true;
        }
        if let Some(pos) = self.pending.iter().position(|e| e.id == id) {
            self.pending.remove(pos);
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.dead).count() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every handler in priority order.
    pub fn dispatch(&mut self, mut invoke: impl FnMut(&mut H)) {
        self.dispatch_inner(|h| {
            invoke(h);
            Flow::Continue
        });
    }

    /// Invoke handlers until one returns false. Returns false if a handler
    /// vetoed, true if the chain ran to completion.
    pub fn dispatch_stop_at_false(&mut self, mut invoke: impl FnMut(&mut H) -> bool) -> bool {
        !self.dispatch_inner(|h| {
            if invoke(h) {
                Flow::Continue
            } else {
                Flow::Stop
            }
        })
    }

    /// Invoke handlers until one returns true. Returns true if any did.
    pub fn dispatch_stop_at_true(&mut self, mut invoke: impl FnMut(&mut H) -> bool) -> bool {
        self.dispatch_inner(|h| {
            if invoke(h) {
                Flow::Stop
            } else {
                Flow::Continue
            }
        })
    }

    /// Runs the entry loop; returns true if a handler stopped the chain.
    fn dispatch_inner(&mut self, mut invoke: impl FnMut(&mut H) -> Flow) -> bool {
        self.depth += 1;
        let mut stopped = false;
        // Index loop: handlers registered mid-dispatch land in `pending`
        // and are not visible to this pass.
        for i in 0..self.entries.len() {
            if self.entries[i].dead {
                continue;
            }
            let flow = invoke(&mut self.entries[i].handler);
            if self.entries[i].once {
                self.entries[i].dead = true;
            }
            if flow == Flow::Stop {
                stopped = true;
                break;
            }
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.sweep();
        }
        stopped
    }

    fn sweep(&mut self) {
        self.entries.retain(|e| !e.dead);
        if !self.pending.is_empty() {
            self.entries.append(&mut self.pending);
            self.entries.sort_by_key(|e| e.priority);
        }
    }

    /// Live handlers in dispatch order, detached from the dispatcher.
    /// Lets cheaply-clonable handlers (fn pointers) run against state the
    /// dispatcher itself lives in.
    pub fn snapshot(&self) -> Vec<H>
    where
        H: Clone,
    {
        self.entries
            .iter()
            .filter(|e| !e.dead)
            .map(|e| e.handler.clone())
            .collect()
    }

    /// Fold another dispatcher's handlers into this one, preserving
    /// priorities. Used when a dispatcher was taken out of its owner for
    /// the duration of a dispatch and registrations landed in a fresh one.
    pub fn merge(&mut self, mut other: Self) {
        self.entries.append(&mut other.entries);
        self.entries.append(&mut other.pending);
        self.entries.retain(|e| !e.dead);
        self.entries.sort_by_key(|e| e.priority);
    }
}

impl<H> Default for EventDispatcher<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let mut d: EventDispatcher<&'static str> = EventDispatcher::new();
        d.register(HandlerPriority::Lowest, "low");
        d.register(HandlerPriority::Highest, "high");
        d.register(HandlerPriority::Default, "mid");

        let mut seen = Vec::new();
        d.dispatch(|h| seen.push(*h));
        assert_eq!(seen, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_registration_order_within_priority() {
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        d.register(HandlerPriority::Default, 1);
        d.register(HandlerPriority::Default, 2);
        d.register(HandlerPriority::Default, 3);

        let mut seen = Vec::new();
        d.dispatch(|h| seen.push(*h));
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_stop_at_false_skips_lower() {
        // A high-priority veto must keep lower handlers untouched.
        let mut d: EventDispatcher<(bool, u32)> = EventDispatcher::new();
        d.register(HandlerPriority::Highest, (false, 0));
        d.register(HandlerPriority::Lowest, (true, 0));

        let vetoed = !d.dispatch_stop_at_false(|(pass, calls)| {
            *calls += 1;
            *pass
        });
        assert!(vetoed);

        let mut counts = Vec::new();
        d.dispatch(|(_, calls)| counts.push(*calls));
        assert_eq!(counts, vec![1, 0]);
    }

    #[test]
    fn test_run_all_reaches_everyone() {
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        d.register(HandlerPriority::Highest, 0);
        d.register(HandlerPriority::Lowest, 0);
        d.dispatch(|calls| *calls += 1);
        let mut total = 0;
        d.dispatch(|calls| total += *calls);
        assert_eq!(total, 2);
    }

    #[test]
    fn test_stop_at_true() {
        let mut d: EventDispatcher<(bool, u32)> = EventDispatcher::new();
        d.register(HandlerPriority::Highest, (true, 0));
        d.register(HandlerPriority::Lowest, (true, 0));

        let claimed = d.dispatch_stop_at_true(|(claim, calls)| {
            *calls += 1;
            *claim
        });
        assert!(claimed);

        let mut counts = Vec::new();
        d.dispatch(|(_, calls)| counts.push(*calls));
        assert_eq!(counts, vec![1, 0]);
    }

    #[test]
    fn test_remove() {
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        let id = d.register(HandlerPriority::Default, 0);
        assert!(d.remove(id));
        assert!(!d.remove(id));
        assert!(d.is_empty());
    }

    #[test]
    fn test_register_once_fires_exactly_once() {
        let mut d: EventDispatcher<u32> = EventDispatcher::new();
        d.register_once(HandlerPriority::Default, 0);
        d.dispatch(|calls| *calls += 1);
        assert!(d.is_empty());
    }
}
