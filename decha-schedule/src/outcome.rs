use decha_time::DechaClock;

use crate::alarm::AlarmId;

/// Result of evaluating one alarm against one DECHA second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Fire,
    Disabled,
    TimeMismatch,
    /// Already fired on today's calendar date.
    AlreadyTriggeredToday,
    /// A `once` alarm that has fired before.
    Exhausted,
    /// The repeat rule excludes today's weekday.
    NotScheduledToday,
}

impl TriggerDecision {
    pub fn should_fire(&self) -> bool {
        matches!(self, TriggerDecision::Fire)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerDecision::Fire => "fire",
            TriggerDecision::Disabled => "disabled",
            TriggerDecision::TimeMismatch => "time-mismatch",
            TriggerDecision::AlreadyTriggeredToday => "already-triggered-today",
            TriggerDecision::Exhausted => "exhausted",
            TriggerDecision::NotScheduledToday => "not-scheduled-today",
        }
    }
}

/// What a single poller tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// DECHA second the tick evaluated, `None` when it was already handled.
    pub evaluated: Option<DechaClock>,
    pub quiet_hours: bool,
    /// Alarms delivered (or at least handed to the sink).
    pub fired: Vec<AlarmId>,
    /// Alarms that matched but were held back by quiet hours.
    pub suppressed: Vec<AlarmId>,
    pub chimed: bool,
    pub notes: Vec<String>,
}

impl TickOutcome {
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn at(time: DechaClock) -> Self {
        Self {
            evaluated: Some(time),
            ..Self::default()
        }
    }

    pub fn was_evaluated(&self) -> bool {
        self.evaluated.is_some()
    }

    pub fn record_fire(&mut self, id: AlarmId) {
        if !self.fired.contains(&id) {
            self.fired.push(id);
        }
    }

    pub fn record_suppressed(&mut self, id: AlarmId) {
        if !self.suppressed.contains(&id) {
            self.suppressed.push(id);
        }
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn is_silent(&self) -> bool {
        self.fired.is_empty() && !self.chimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_alarm_once() {
        let mut outcome = TickOutcome::at(DechaClock::default());
        outcome.record_fire(AlarmId::new("a"));
        outcome.record_fire(AlarmId::new("a"));
        outcome.record_suppressed(AlarmId::new("b"));
        assert_eq!(outcome.fired.len(), 1);
        assert_eq!(outcome.suppressed.len(), 1);
        assert!(!outcome.is_silent());
        assert!(TickOutcome::skipped().is_silent());
        assert!(!TickOutcome::skipped().was_evaluated());
    }
}
