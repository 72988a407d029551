//! Loading interaction event logs from CSV files.
//!
//! Collaborators persist events in their own storage; exporting them
//! as `(user_id, item_id, kind)` records is the simplest way to feed
//! offline experiments and the hyperparameter search driver.
use std::path::Path;

use csv;
use failure;

use data::{Event, EventKind};

#[derive(Debug, Deserialize)]
struct EventRecord {
    user_id: usize,
    item_id: usize,
    kind: EventKind,
}

/// Read events from a headered CSV file with `user_id`, `item_id`, and
/// `kind` columns; `kind` is one of `view`, `like`, `comment`, or
/// `apply`.
pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>, failure::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut events = Vec::new();

    for record in reader.deserialize() {
        let record: EventRecord = record?;
        events.push(Event::new(record.user_id, record.item_id, record.kind));
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use super::*;

    #[test]
    fn round_trips_a_small_log() {
        let path = env::temp_dir().join(format!("linkrec-events-{}.csv", ::std::process::id()));
        fs::write(
            &path,
            "user_id,item_id,kind\n1,10,view\n2,10,apply\n1,11,comment\n",
        ).unwrap();

        let events = load_events(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].user_id(), 1);
        assert_eq!(events[0].item_id(), 10);
        assert_eq!(events[0].kind(), EventKind::View);
        assert_eq!(events[1].kind(), EventKind::Apply);
        assert_eq!(events[2].kind(), EventKind::Comment);
    }

    #[test]
    fn malformed_kinds_are_errors() {
        let path = env::temp_dir().join(format!("linkrec-bad-{}.csv", ::std::process::id()));
        fs::write(&path, "user_id,item_id,kind\n1,10,poke\n").unwrap();

        let result = load_events(&path);
        fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
