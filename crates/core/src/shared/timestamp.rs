use std::time::Instant;

/// Packet timestamp in microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub fn micros(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// Issues strictly increasing timestamps derived from a monotonic clock.
///
/// Two calls within the same microsecond still get distinct timestamps: the
/// second is bumped to one past the first.
pub struct MonotonicClock {
    origin: Instant,
    last: Option<Timestamp>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last: None,
        }
    }

    pub fn next(&mut self) -> Timestamp {
        let elapsed = self.origin.elapsed().as_micros() as i64;
        let next = match self.last {
            Some(prev) if elapsed <= prev.micros() => prev.micros() + 1,
            _ => elapsed,
        };
        let ts = Timestamp(next);
        self.last = Some(ts);
        ts
    }

    pub fn last(&self) -> Option<Timestamp> {
        self.last
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
