/// Outcome of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// One second elapsed; `remaining` seconds are left.
    Tick { remaining: u32 },
    /// The countdown just hit zero. Fired exactly once per clock.
    Expired,
    /// The clock has already expired; the tick had no effect.
    Idle,
}

/// Tick-driven countdown for a non-survey session.
///
/// The clock itself carries no scheduling: the host delivers one `tick()`
/// per second from whatever periodic primitive it has. It runs
/// unconditionally while the session is active — nothing pauses it — and
/// guarantees at most one `Expired` event regardless of how many ticks
/// arrive afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownClock {
    remaining: u32,
    expired_fired: bool,
}

impl CountdownClock {
    /// Build a clock from the configured time limit.
    ///
    /// A limit of 0 minutes means no limit was configured; the degenerate
    /// fallback is one second per question.
    #[must_use]
    pub fn for_exam(time_limit_minutes: u32, question_count: usize) -> Self {
        let remaining = if time_limit_minutes > 0 {
            time_limit_minutes.saturating_mul(60)
        } else {
            u32::try_from(question_count).unwrap_or(u32::MAX)
        };

        Self {
            remaining,
            expired_fired: false,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired_fired
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> ClockEvent {
        if self.expired_fired {
            return ClockEvent::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired_fired = true;
            ClockEvent::Expired
        } else {
            ClockEvent::Tick {
                remaining: self.remaining,
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
