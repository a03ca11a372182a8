//! Deadline-ordered timers executed at step 2 of each tick. Timers are
//! not preemptive: a deadline landing mid-tick runs at the next tick.

use crate::world::World;
use std::time::{Duration, Instant};

pub type TimerId = u64;
pub type TimerCallback = Box<dyn FnMut(&mut World)>;

/// Timer IDs are process-unique so queues detached during callback runs
/// merge back without collisions.
static NEXT_TIMER_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

struct Timer {
    id: TimerId,
    deadline: Instant,
    interval: Option<Duration>,
    callback: TimerCallback,
    killed: bool,
}

#[derive(Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a one-shot timer.
    pub fn set(&mut self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.insert(delay, None, callback)
    }

    /// Schedule a repeating timer with the given period.
    pub fn set_repeating(&mut self, interval: Duration, callback: TimerCallback) -> TimerId {
        self.insert(interval, Some(interval), callback)
    }

    fn insert(
        &mut self,
        delay: Duration,
        interval: Option<Duration>,
        callback: TimerCallback,
    ) -> TimerId {
        let id = NEXT_TIMER_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.timers.push(Timer {
            id,
            deadline: Instant::now() + delay,
            interval,
            callback,
            killed: false,
        });
        id
    }

    pub fn kill(&mut self, id: TimerId) -> bool {
        match self.timers.iter_mut().find(|t| t.id == id && !t.killed) {
            Some(timer) => {
                timer.killed = true;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.timers.iter().filter(|t| !t.killed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run every timer whose deadline has passed. The queue is detached from
/// the world while callbacks run so they can schedule or kill timers.
pub fn run_due(world: &mut World, now: Instant) {
    let mut queue = std::mem::take(&mut world.timers);

    for timer in &mut queue.timers {
        if timer.killed || timer.deadline > now {
            continue;
        }
        (timer.callback)(world);
        match timer.interval {
            Some(interval) => timer.deadline = now + interval,
            None => timer.killed = true,
        }
    }
    queue.timers.retain(|t| !t.killed);

    // Timers scheduled by callbacks landed in the fresh queue.
    let added = std::mem::take(&mut world.timers);
    queue.timers.extend(added.timers);
    world.timers = queue;
}
