//! Post-collection certification of the newest-to-oldest invariant.

use crate::error::SweepError;
use crate::model::Record;

/// Certify that `records` is sorted by timestamp, newest first.
///
/// Scans adjacent pairs left to right and fails on the first pair that
/// rises; equal timestamps are allowed. Empty and single-element slices
/// pass trivially. Pure check, no mutation, no aggregation of violations.
pub fn verify_descending(records: &[Record]) -> Result<(), SweepError> {
    for i in 1..records.len() {
        if records[i].timestamp_ms > records[i - 1].timestamp_ms {
            return Err(SweepError::OrderViolation {
                index: i,
                title: records[i].title.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, ts: i64) -> Record {
        Record {
            id: id.to_string(),
            title: format!("entry {id}"),
            timestamp_ms: ts,
        }
    }

    #[test]
    fn test_verify_non_increasing_passes() {
        let records = [
            record("a", 100),
            record("b", 90),
            record("c", 90),
            record("d", 50),
        ];
        assert!(verify_descending(&records).is_ok());
    }

    #[test]
    fn test_verify_reports_first_violation() {
        let records = [record("a", 100), record("b", 90), record("c", 95)];
        match verify_descending(&records) {
            Err(SweepError::OrderViolation { index, title }) => {
                assert_eq!(index, 2);
                assert_eq!(title, "entry c");
            }
            other => panic!("expected order violation, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_empty_and_single_pass() {
        assert!(verify_descending(&[]).is_ok());
        assert!(verify_descending(&[record("a", 100)]).is_ok());
    }
}
