use thiserror::Error;

/// Errors raised where user-entered time data crosses into the DECHA core.
///
/// The conversion functions themselves are total; these only come out of
/// constructors and parsers that validate ranges.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("{field} out of range: {value} (expected 0..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("malformed time {input:?}: expected {expected}")]
    Malformed {
        input: String,
        expected: &'static str,
    },

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("local time {time} does not exist on {date} in {timezone}")]
    NonexistentLocalTime {
        date: String,
        time: String,
        timezone: String,
    },
}

impl TimeError {
    pub(crate) fn check(field: &'static str, value: u32, max: u32) -> Result<(), TimeError> {
        if value > max {
            return Err(TimeError::OutOfRange { field, value, max });
        }
        Ok(())
    }

    pub(crate) fn malformed(input: &str, expected: &'static str) -> Self {
        TimeError::Malformed {
            input: input.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_the_field() {
        let err = TimeError::check("DECHA hours", 12, 9).unwrap_err();
        assert_eq!(err.to_string(), "DECHA hours out of range: 12 (expected 0..=9)");
        assert!(TimeError::check("DECHA hours", 9, 9).is_ok());
    }
}
