/// Consequence of one reported attention-loss signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityAction {
    /// First loss of focus: non-blocking warning, no score effect.
    Warning,
    /// A penalty was added; `total` is the cumulative penalty so far.
    Penalty { added: u32, total: u32 },
    /// Too many violations: submission must be forced immediately.
    ForceSubmit,
    /// Submission was already forced; further signals have no defined effect.
    Exhausted,
    /// Monitoring is not active (survey set, or the session is finalizing).
    Ignored,
}

/// Escalating tamper state machine for a non-survey session.
///
/// Each call to `record_signal` is one focus-loss *edge*; the caller is
/// responsible for collapsing repeated raw events into edges and for gating
/// signals on session phase. Thresholds fire exactly once because the count
/// only ever moves forward:
///
/// | count | consequence          |
/// |-------|----------------------|
/// | 1     | warning              |
/// | 2     | +2 penalty (total 2) |
/// | 3     | +3 penalty (total 5) |
/// | 4     | forced submission    |
///
/// A single accidental tab switch costs nothing; habitual switching ends the
/// attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityMonitor {
    tamper_count: u32,
    penalty_points: u32,
}

impl IntegrityMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of focus-loss edges seen so far. Never decreases.
    #[must_use]
    pub fn tamper_count(&self) -> u32 {
        self.tamper_count
    }

    /// Accumulated score penalty. Never decreases.
    #[must_use]
    pub fn penalty_points(&self) -> u32 {
        self.penalty_points
    }

    /// Register one focus-loss edge and return the consequence.
    pub fn record_signal(&mut self) -> IntegrityAction {
        self.tamper_count += 1;
        match self.tamper_count {
            1 => IntegrityAction::Warning,
            2 => {
                self.penalty_points += 2;
                IntegrityAction::Penalty {
                    added: 2,
                    total: self.penalty_points,
                }
            }
            3 => {
                self.penalty_points += 3;
                IntegrityAction::Penalty {
                    added: 3,
                    total: self.penalty_points,
                }
            }
            4 => IntegrityAction::ForceSubmit,
            _ => IntegrityAction::Exhausted,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
