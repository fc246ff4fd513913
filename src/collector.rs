#![deny(missing_docs)]

//! # Record Collector
//!
//! Accumulates named records as they are discovered during synthesis,
//! enforcing at-most-one record per distinct name in first-discovery order.
//!
//! A name can be *reserved* before its fields exist; this is the
//! cycle-breaking mechanism: a schema reachable from itself observes its own
//! reservation and short-circuits instead of re-entering synthesis.

use crate::model::Record;
use indexmap::IndexMap;

/// Per-call record accumulator. First writer wins; later collisions on the
/// same name are silently dropped.
#[derive(Debug, Default)]
pub(crate) struct RecordCollector {
    slots: IndexMap<String, Option<Record>>,
}

impl RecordCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `name` ahead of its synthesis. Returns true when the name
    /// was new; false means a record (or reservation) already owns it and
    /// the caller must not re-enter synthesis.
    pub(crate) fn reserve(&mut self, name: &str) -> bool {
        if self.slots.contains_key(name) {
            return false;
        }
        self.slots.insert(name.to_string(), None);
        true
    }

    /// Fills a reserved slot. A slot already holding a record keeps it.
    pub(crate) fn complete(&mut self, record: Record) {
        match self.slots.get_mut(&record.name) {
            Some(slot @ None) => *slot = Some(record),
            Some(Some(_)) => {}
            None => {
                self.slots.insert(record.name.clone(), Some(record));
            }
        }
    }

    /// Completed records in first-discovery order. Reservations that never
    /// produced a record (empty parameter groups) are dropped.
    pub(crate) fn into_records(self) -> Vec<Record> {
        self.slots.into_values().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> Record {
        Record {
            name: name.to_string(),
            description: None,
            fields: Vec::new(),
            placement: None,
        }
    }

    #[test]
    fn test_first_writer_wins() {
        let mut collector = RecordCollector::new();
        collector.reserve("Pet");
        let mut first = record("Pet");
        first.description = Some("first".into());
        collector.complete(first);
        let mut second = record("Pet");
        second.description = Some("second".into());
        collector.complete(second);

        let records = collector.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description.as_deref(), Some("first"));
    }

    #[test]
    fn test_reservation_blocks_reentry_and_keeps_order() {
        let mut collector = RecordCollector::new();
        assert!(collector.reserve("A"));
        assert!(!collector.reserve("A"));
        assert!(collector.reserve("B"));
        collector.complete(record("B"));
        collector.complete(record("A"));

        let names: Vec<String> = collector.into_records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_unfilled_reservation_is_dropped() {
        let mut collector = RecordCollector::new();
        collector.reserve("Empty");
        collector.reserve("Kept");
        collector.complete(record("Kept"));
        let names: Vec<String> = collector.into_records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Kept"]);
    }
}
