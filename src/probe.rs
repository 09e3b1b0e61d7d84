//! The measurement probe: wraps one operation invocation, capturing
//! wall-clock duration and a point-in-time resource sample around the call.
//!
//! Operations are never measured concurrently; the blocking adapter call is
//! the measurement. A failed operation propagates as
//! [`HarnessError::Operation`] and produces no record — failures are never
//! logged as zero-duration successes.

use crate::resources::ResourceSampler;
use crate::{ExecOutcome, HarnessError, HarnessResult, MeasurementRecord, WorkloadOperation};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Time `f`, sample resources once after it completes, and build the record.
pub fn measure<F>(
    operation: WorkloadOperation,
    sampler: &ResourceSampler,
    f: F,
) -> HarnessResult<MeasurementRecord>
where
    F: FnOnce() -> HarnessResult<ExecOutcome>,
{
    let timestamp = utc_timestamp();
    let start = Instant::now();

    let outcome = f().map_err(|e| HarnessError::Operation {
        operation,
        message: e.to_string(),
    })?;

    let duration = start.elapsed();
    let sample = sampler.sample();

    Ok(MeasurementRecord {
        timestamp,
        operation,
        duration_seconds: duration.as_secs_f64(),
        cpu_percent: sample.cpu_percent,
        memory_mb: sample.memory_mb,
        notes: outcome.notes,
    })
}

/// Current UTC wall-clock time as `YYYY-MM-DD HH:MM:SS`.
pub fn utc_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_epoch_secs(secs)
}

fn format_epoch_secs(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60
    )
}

// Days-since-epoch to proleptic Gregorian date.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_sampler() -> ResourceSampler {
        ResourceSampler::new(Duration::from_millis(1))
    }

    #[test]
    fn success_produces_a_record_with_nonnegative_duration() {
        let record = measure(WorkloadOperation::ReadIntensive, &fast_sampler(), || {
            Ok(ExecOutcome::clean())
        })
        .unwrap();

        assert_eq!(record.operation, WorkloadOperation::ReadIntensive);
        assert!(record.duration_seconds >= 0.0);
        assert!(record.notes.is_none());
    }

    #[test]
    fn adapter_notes_flow_into_the_record() {
        let record = measure(WorkloadOperation::Indexing, &fast_sampler(), || {
            Ok(ExecOutcome::noted("indexing fallback: filtered scan"))
        })
        .unwrap();
        assert_eq!(
            record.notes.as_deref(),
            Some("indexing fallback: filtered scan")
        );
    }

    #[test]
    fn failure_propagates_without_a_record() {
        let result = measure(WorkloadOperation::Mixed, &fast_sampler(), || {
            Err(HarnessError::Engine {
                engine: "test".into(),
                message: "connection lost".into(),
            })
        });

        match result {
            Err(HarnessError::Operation { operation, message }) => {
                assert_eq!(operation, WorkloadOperation::Mixed);
                assert!(message.contains("connection lost"));
            }
            other => panic!("expected operation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn epoch_formatting_round_trips_known_dates() {
        assert_eq!(format_epoch_secs(0), "1970-01-01 00:00:00");
        // The canonical fixture review time.
        assert_eq!(format_epoch_secs(1_382_659_200), "2013-10-25 00:00:00");
        assert_eq!(format_epoch_secs(1_382_659_200 + 3_661), "2013-10-25 01:01:01");
    }
}
