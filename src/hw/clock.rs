use std::cmp::Reverse;
use std::time::Duration;

struct Subscription<S> {
    priority: i32,
    seq: u64,
    subscriber: S,
}

// The owner advances the clock and walks subscribers_mut() itself.
pub struct Clock<S> {
    subscribers: Vec<Subscription<S>>,
    next_seq: u64,
    last_tick: u64,
    speed: f64,
    overclocked: bool,
}

impl<S> Clock<S> {
    /// `speed` is in ticks per second.
    pub fn new(speed: f64) -> Clock<S> {
        Clock {
            subscribers: Vec::new(),
            next_seq: 0,
            last_tick: 0,
            speed,
            overclocked: false,
        }
    }

    pub fn add_subscriber(&mut self, subscriber: S, priority: i32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let key = (Reverse(priority), seq);
        let at = self
            .subscribers
            .partition_point(|s| (Reverse(s.priority), s.seq) < key);
        self.subscribers.insert(
            at,
            Subscription {
                priority,
                seq,
                subscriber,
            },
        );
    }

    /// Subscribers in notification order.
    pub fn subscribers_mut(&mut self) -> impl Iterator<Item = &mut S> {
        self.subscribers.iter_mut().map(|s| &mut s.subscriber)
    }

    pub fn advance(&mut self) -> u64 {
        self.last_tick += 1;
        self.last_tick
    }

    pub fn last_tick(&self) -> u64 {
        self.last_tick
    }

    pub fn overclock(&mut self) {
        self.overclocked = true;
    }

    pub fn reset(&mut self) {
        self.overclocked = false;
    }

    pub fn is_overclocked(&self) -> bool {
        self.overclocked
    }

    /// Pause between two background ticks.
    pub fn delay(&self) -> Duration {
        if self.overclocked {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / self.speed)
        }
    }
}
