use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::alarm::Alarm;
use crate::calendar::CalendarEvent;
use crate::error::ScheduleError;

/// Records that carry a unique identifier.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Alarm {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for CalendarEvent {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Reads alarms from a JSON or YAML file.
///
/// Accepts the exported array, a single alarm, or a document with an
/// `alarms` list.
pub fn load_alarms(path: impl AsRef<Path>) -> Result<Vec<Alarm>, ScheduleError> {
    load_records(path.as_ref(), "alarms")
}

/// Reads calendar events from a JSON or YAML file, same shapes as
/// [`load_alarms`] with an `events` document key.
pub fn load_events(path: impl AsRef<Path>) -> Result<Vec<CalendarEvent>, ScheduleError> {
    load_records(path.as_ref(), "events")
}

fn load_records<T>(path: &Path, document_key: &str) -> Result<Vec<T>, ScheduleError>
where
    T: DeserializeOwned + Keyed,
{
    if !path.exists() {
        return Err(ScheduleError::MissingPath(path.display().to_string()));
    }
    let raw = fs::read_to_string(path).map_err(|err| ScheduleError::from_io(path, err))?;
    parse_records(&raw, &path.display().to_string(), document_key)
}

/// Parses exported records. `origin` names the source in error messages.
pub fn parse_records<T>(raw: &str, origin: &str, document_key: &str) -> Result<Vec<T>, ScheduleError>
where
    T: DeserializeOwned + Keyed,
{
    let value: Value = serde_yaml::from_str(raw)
        .map_err(|err| ScheduleError::parse_error(origin, err.to_string()))?;

    let mut attempts = Vec::new();
    let mut records = None;

    if let Some(list) = value.get(document_key) {
        match serde_yaml::from_value::<Vec<T>>(list.clone()) {
            Ok(parsed) => records = Some(parsed),
            Err(err) => attempts.push(format!("{document_key} document: {err}")),
        }
    }

    if records.is_none() && value.is_sequence() {
        match serde_yaml::from_value::<Vec<T>>(value.clone()) {
            Ok(parsed) => records = Some(parsed),
            Err(err) => attempts.push(format!("list: {err}")),
        }
    }

    if records.is_none() && value.is_mapping() {
        match serde_yaml::from_value::<T>(value) {
            Ok(single) => records = Some(vec![single]),
            Err(err) => attempts.push(format!("single: {err}")),
        }
    }

    let records = records.ok_or_else(|| {
        let message = if attempts.is_empty() {
            "expected a list, a single record or a document".to_string()
        } else {
            attempts.join("; ")
        };
        ScheduleError::parse_error(origin, message)
    })?;

    deduplicate(&records)?;
    Ok(records)
}

fn deduplicate<T: Keyed>(records: &[T]) -> Result<(), ScheduleError> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.key()) {
            return Err(ScheduleError::DuplicateRecord {
                id: record.key().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORTED: &str = r#"[
  {
    "id": "a1",
    "dechaTime": { "hours": 2, "minutes": 50, "seconds": 0 },
    "label": "Wake",
    "enabled": true,
    "repeat": "weekdays",
    "sound": true,
    "snoozeCount": 0,
    "createdAt": 1717200000000
  }
]"#;

    #[test]
    fn reads_exported_array() {
        let alarms: Vec<Alarm> = parse_records(EXPORTED, "inline", "alarms").expect("alarms");
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].label, "Wake");
    }

    #[test]
    fn reads_yaml_document_and_single_record() {
        let yaml = r#"
alarms:
  - id: b1
    dechaTime: { hours: 7, minutes: 0, seconds: 0 }
    label: Tea
    repeat: daily
    createdAt: 1717200000000
"#;
        let alarms: Vec<Alarm> = parse_records(yaml, "inline", "alarms").expect("document");
        assert_eq!(alarms[0].id.as_str(), "b1");

        let single = r#"{"id": "c1", "dechaTime": {"hours": 1, "minutes": 0, "seconds": 0}, "createdAt": 0}"#;
        let alarms: Vec<Alarm> = parse_records(single, "inline", "alarms").expect("single");
        assert_eq!(alarms.len(), 1);
        assert!(alarms[0].enabled);
    }

    #[test]
    fn rejects_duplicates() {
        let doubled = format!("[{0}, {0}]", &EXPORTED[1..EXPORTED.len() - 1]);
        let err = parse_records::<Alarm>(&doubled, "inline", "alarms").unwrap_err();
        assert!(matches!(err, ScheduleError::DuplicateRecord { id } if id == "a1"));
    }

    #[test]
    fn reports_garbage() {
        assert!(matches!(
            parse_records::<Alarm>("42", "inline", "alarms"),
            Err(ScheduleError::Parse { .. })
        ));
        assert!(matches!(
            parse_records::<Alarm>("[{\"label\": \"no time\"}]", "inline", "alarms"),
            Err(ScheduleError::Parse { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("alarms.json");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(EXPORTED.as_bytes()).expect("write");

        assert_eq!(load_alarms(&path).expect("load").len(), 1);
        assert!(matches!(
            load_alarms(dir.path().join("missing.json")),
            Err(ScheduleError::MissingPath(_))
        ));
    }
}
