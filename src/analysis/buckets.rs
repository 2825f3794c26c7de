//! 30-minute time buckets

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BUCKET_MINUTES: u32 = 30;
pub const DAY_BUCKETS: i64 = 48;
/// Bucket assigned to days where price never came back to the level
pub const NO_RETRACEMENT: i64 = -1;

/// Number of days that landed in a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: i64,
    pub count: i64,
}

/// Bucket of a time within a session that starts at `start_hour` on the hour
pub fn session_bucket(time: NaiveTime, start_hour: u32) -> i64 {
    (time.hour() as i64 - start_hour as i64) * 2 + (time.minute() / BUCKET_MINUTES) as i64
}

/// Whole 30-minute periods elapsed between two timestamps
pub fn elapsed_bucket(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from)
        .num_seconds()
        .div_euclid((BUCKET_MINUTES * 60) as i64)
}

/// Bucket of a time across the whole day (0..48)
pub fn day_bucket(time: NaiveTime) -> i64 {
    ((time.hour() * 60 + time.minute()) / BUCKET_MINUTES) as i64
}

/// Tally bucket indexes, ordered by bucket
pub fn count_buckets<I>(buckets: I) -> Vec<BucketCount>
where
    I: IntoIterator<Item = i64>,
{
    let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
    for bucket in buckets {
        *counts.entry(bucket).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(bucket, count)| BucketCount { bucket, count })
        .collect()
}

/// Ensure every day bucket 0..48 is present, zero-filled
pub fn fill_day_buckets(counts: &[BucketCount]) -> Vec<BucketCount> {
    (0..DAY_BUCKETS)
        .map(|bucket| BucketCount {
            bucket,
            count: counts
                .iter()
                .find(|c| c.bucket == bucket)
                .map(|c| c.count)
                .unwrap_or(0),
        })
        .collect()
}

fn clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Labels for session buckets, e.g. `08:00-08:30` .. `15:30-16:00`
pub fn session_bucket_labels(start_hour: u32, close_hour: u32) -> Vec<String> {
    (start_hour * 60..close_hour * 60)
        .step_by(BUCKET_MINUTES as usize)
        .map(|m| format!("{}-{}", clock(m), clock(m + BUCKET_MINUTES)))
        .collect()
}

/// Labels for buckets counted from a formation time until the close,
/// e.g. `09:35-10:05` .. `15:35-16:05`
pub fn elapsed_bucket_labels(from: NaiveTime, close_hour: u32) -> Vec<String> {
    let start = from.hour() * 60 + from.minute();
    (start..close_hour * 60)
        .step_by(BUCKET_MINUTES as usize)
        .map(|m| format!("{}-{}", clock(m), clock(m + BUCKET_MINUTES)))
        .collect()
}

/// Labels for the 48 day buckets, `00:00-00:30` .. `23:30-24:00`
pub fn day_bucket_labels() -> Vec<String> {
    session_bucket_labels(0, 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_time(t(h, m))
    }

    #[test]
    fn test_session_bucket() {
        assert_eq!(session_bucket(t(8, 0), 8), 0);
        assert_eq!(session_bucket(t(8, 29), 8), 0);
        assert_eq!(session_bucket(t(8, 30), 8), 1);
        assert_eq!(session_bucket(t(10, 45), 8), 5);
        assert_eq!(session_bucket(t(15, 59), 8), 15);
    }

    #[test]
    fn test_elapsed_bucket() {
        assert_eq!(elapsed_bucket(dt(9, 35), dt(9, 36)), 0);
        assert_eq!(elapsed_bucket(dt(9, 35), dt(10, 5)), 1);
        assert_eq!(elapsed_bucket(dt(9, 35), dt(12, 0)), 4);
    }

    #[test]
    fn test_day_bucket() {
        assert_eq!(day_bucket(t(0, 0)), 0);
        assert_eq!(day_bucket(t(9, 30)), 19);
        assert_eq!(day_bucket(t(23, 59)), 47);
    }

    #[test]
    fn test_count_buckets_sorted() {
        let counts = count_buckets(vec![3, -1, 3, 0, -1, 3]);
        assert_eq!(
            counts,
            vec![
                BucketCount { bucket: -1, count: 2 },
                BucketCount { bucket: 0, count: 1 },
                BucketCount { bucket: 3, count: 3 },
            ]
        );
    }

    #[test]
    fn test_fill_day_buckets() {
        let filled = fill_day_buckets(&[BucketCount { bucket: 19, count: 4 }]);
        assert_eq!(filled.len(), 48);
        assert_eq!(filled[19].count, 4);
        assert_eq!(filled.iter().map(|c| c.count).sum::<i64>(), 4);
    }

    #[test]
    fn test_session_labels() {
        let labels = session_bucket_labels(8, 16);
        assert_eq!(labels.len(), 16);
        assert_eq!(labels[0], "08:00-08:30");
        assert_eq!(labels[1], "08:30-09:00");
        assert_eq!(labels[15], "15:30-16:00");
    }

    #[test]
    fn test_elapsed_labels() {
        let labels = elapsed_bucket_labels(t(9, 35), 16);
        assert_eq!(labels.first().map(String::as_str), Some("09:35-10:05"));
        assert_eq!(labels.last().map(String::as_str), Some("15:35-16:05"));
        assert_eq!(labels.len(), 13);
    }

    #[test]
    fn test_day_labels() {
        let labels = day_bucket_labels();
        assert_eq!(labels.len(), 48);
        assert_eq!(labels[47], "23:30-24:00");
    }
}
