//! Sample events.

/// Request-like event carrying a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ping {
    /// Sequence number.
    pub seq: u64,
}

impl Ping {
    /// Ping number `seq`.
    #[must_use]
    pub fn new(seq: u64) -> Self {
        Self { seq }
    }

    /// The matching reply.
    #[must_use]
    pub fn reply(self) -> Pong {
        Pong { seq: self.seq }
    }
}

/// Reply to a [`Ping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pong {
    /// Sequence number of the ping being answered.
    pub seq: u64,
}

impl Pong {
    /// Pong number `seq`.
    #[must_use]
    pub fn new(seq: u64) -> Self {
        Self { seq }
    }
}

/// Payload-free event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tick;
