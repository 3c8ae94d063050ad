//! In-memory aggregation that turns raw record lists into dashboard views.
//!
//! Every function here borrows its input and never mutates it. The reference
//! instant is always supplied by the caller; nothing in this module reads the
//! wall clock. Day and month keys are UTC calendar dates.
//!
//! Records whose timestamp is missing or unparseable cannot be placed on a
//! time axis. Time-based functions leave them out and report how many were
//! dropped in a `skipped` counter instead of failing.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;

/// Marker appended to keys shortened by [`truncate_text`].
pub const ELLIPSIS: &str = "...";

/// Accessor for one optional text field of a record.
pub type Field<T> = fn(&T) -> Option<&str>;

/// Records that passed a time filter, plus the count left out for bad timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Windowed<'a, T> {
    pub records: Vec<&'a T>,
    pub skipped: usize,
}

/// Activity on a single UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    /// Distinct users with at least one record that day.
    pub users: usize,
    pub images: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    pub buckets: Vec<DailyBucket>,
    pub skipped: usize,
}

/// A grouping key and how many records fell into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub count: usize,
}

/// Record count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    /// Display label such as `Jan 2024`.
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySeries {
    pub months: Vec<MonthlyCount>,
    pub skipped: usize,
}

/// Parse an ISO-8601 timestamp as produced by the record store.
///
/// Accepts RFC 3339, Postgres text output (`2024-01-01 10:00:00+00`),
/// offset-less date-times (read as UTC) and bare dates (UTC midnight).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn record_timestamp<T>(record: &T, timestamp: Field<T>) -> Option<DateTime<Utc>> {
    timestamp(record).and_then(parse_timestamp)
}

/// Keep records where any of `fields` contains `query`, ignoring case.
///
/// A blank query keeps everything. Input order is preserved.
pub fn filter_by_text<'a, T, I>(records: I, query: &str, fields: &[Field<T>]) -> Vec<&'a T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.into_iter().collect();
    }

    records
        .into_iter()
        .filter(|record| {
            fields.iter().any(|field| {
                field(*record)
                    .map(|value| value.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .collect()
}

/// Keep records whose timestamp lies in `[now - window_days, now]`.
pub fn filter_by_window<'a, T, I>(
    records: I,
    window_days: u32,
    timestamp: Field<T>,
    now: DateTime<Utc>,
) -> Windowed<'a, T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
{
    let lower = now
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    retain_by_time(records, timestamp, |ts| ts >= lower && ts <= now)
}

/// Start of the first UTC day covered by [`bucket_by_day`] for this window.
///
/// `None` when the window covers no days at all.
pub fn first_bucket_start(window_days: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let offset = window_days.checked_sub(1)?;
    now.date_naive()
        .checked_sub_days(Days::new(u64::from(offset)))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc())
}

/// Keep records dated on one of the `window_days` UTC days ending on `now`'s
/// date, and not after `now`.
///
/// This is the span [`bucket_by_day`] charts, so headline counts taken from
/// the result always equal the sum of the daily buckets.
pub fn filter_by_days<'a, T, I>(
    records: I,
    window_days: u32,
    timestamp: Field<T>,
    now: DateTime<Utc>,
) -> Windowed<'a, T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
{
    let lower = first_bucket_start(window_days, now);
    retain_by_time(records, timestamp, |ts| {
        lower.map_or(false, |lower| ts >= lower && ts <= now)
    })
}

fn retain_by_time<'a, T, I, F>(records: I, timestamp: Field<T>, keep: F) -> Windowed<'a, T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(DateTime<Utc>) -> bool,
{
    let mut kept = Vec::new();
    let mut skipped = 0;
    for record in records {
        match record_timestamp(record, timestamp) {
            Some(ts) if keep(ts) => kept.push(record),
            Some(_) => {}
            None => skipped += 1,
        }
    }

    Windowed {
        records: kept,
        skipped,
    }
}

/// One bucket per UTC day for the `window_days` days ending on `now`'s date.
///
/// Days without records are present with zero counts. Records dated outside
/// the window are ignored; records without a usable timestamp are counted in
/// `skipped`.
pub fn bucket_by_day<'a, T, I>(
    records: I,
    window_days: u32,
    timestamp: Field<T>,
    user: Field<T>,
    now: DateTime<Utc>,
) -> DailySeries
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
{
    let today = now.date_naive();
    let dates: Vec<NaiveDate> = (0..window_days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .collect();
    let index: HashMap<NaiveDate, usize> = dates
        .iter()
        .enumerate()
        .map(|(pos, date)| (*date, pos))
        .collect();

    let mut images = vec![0usize; dates.len()];
    let mut users: Vec<HashSet<&str>> = vec![HashSet::new(); dates.len()];
    let mut skipped = 0;

    for record in records {
        let Some(ts) = record_timestamp(record, timestamp) else {
            skipped += 1;
            continue;
        };
        if let Some(&pos) = index.get(&ts.date_naive()) {
            images[pos] += 1;
            if let Some(id) = user(record) {
                users[pos].insert(id);
            }
        }
    }

    let buckets = dates
        .into_iter()
        .zip(images)
        .zip(users)
        .map(|((date, images), users)| DailyBucket {
            date,
            users: users.len(),
            images,
        })
        .collect();

    DailySeries { buckets, skipped }
}

/// Shorten `text` to `max_chars` characters, marking the cut with [`ELLIPSIS`].
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Count records per key and return the `limit` most frequent keys.
///
/// Ordered by count descending; equal counts keep the order in which each
/// key was first seen. Records for which `key_fn` yields `None` are ignored.
pub fn top_by_frequency<'a, T, I, F>(records: I, key_fn: F, limit: usize) -> Vec<RankedEntry>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<String>,
{
    let mut ranked: Vec<RankedEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(key) = key_fn(record) else {
            continue;
        };
        match positions.get(&key) {
            Some(&pos) => ranked[pos].count += 1,
            None => {
                positions.insert(key.clone(), ranked.len());
                ranked.push(RankedEntry { key, count: 1 });
            }
        }
    }

    // `sort_by` is stable, which keeps first-seen order among ties.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Records per UTC calendar month, for the last `months_back` months that
/// have at least one record. Months with no records do not appear.
pub fn monthly_growth<'a, T, I>(records: I, timestamp: Field<T>, months_back: usize) -> MonthlySeries
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut skipped = 0;

    for record in records {
        let Some(ts) = record_timestamp(record, timestamp) else {
            skipped += 1;
            continue;
        };
        let date = ts.date_naive();
        match date.with_day0(0) {
            Some(month_start) => *counts.entry(month_start).or_default() += 1,
            None => skipped += 1,
        }
    }

    let start = counts.len().saturating_sub(months_back);
    let months = counts
        .into_iter()
        .skip(start)
        .map(|(month_start, count)| MonthlyCount {
            month: month_start.format("%Y-%m").to_string(),
            label: month_start.format("%b %Y").to_string(),
            count,
        })
        .collect();

    MonthlySeries { months, skipped }
}

/// Number of distinct non-empty values of `key` among `records`.
pub fn distinct_count<'a, T, I>(records: I, key: Field<T>) -> usize
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
{
    records
        .into_iter()
        .filter_map(|record| key(record))
        .collect::<HashSet<&str>>()
        .len()
}

/// Average per day; zero when there are no days.
pub fn mean_per_day(total: usize, days: u32) -> f64 {
    if days == 0 {
        return 0.0;
    }
    total as f64 / f64::from(days)
}

/// Render a daily series as `Date,Users,Images` CSV.
///
/// Rows are separated by `\n` and the text has no trailing newline.
pub fn export_csv(buckets: &[DailyBucket]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(["Date", "Users", "Images"])
        .map_err(|e| AppError::Internal(format!("CSV write failed: {e}")))?;
    for bucket in buckets {
        writer
            .write_record([
                bucket.date.format("%Y-%m-%d").to_string(),
                bucket.users.to_string(),
                bucket.images.to_string(),
            ])
            .map_err(|e| AppError::Internal(format!("CSV write failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {e}")))?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {e}")))?;
    let trimmed_len = text.trim_end_matches('\n').len();
    text.truncate(trimmed_len);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        user: Option<&'static str>,
        text: &'static str,
        note: Option<&'static str>,
        at: Option<&'static str>,
    }

    impl Row {
        fn new(user: &'static str, at: &'static str) -> Self {
            Self {
                user: Some(user),
                text: "",
                note: None,
                at: Some(at),
            }
        }

        fn text(text: &'static str, note: Option<&'static str>) -> Self {
            Self {
                user: None,
                text,
                note,
                at: None,
            }
        }

        fn user_field(&self) -> Option<&str> {
            self.user
        }

        fn text_field(&self) -> Option<&str> {
            Some(self.text)
        }

        fn note_field(&self) -> Option<&str> {
            self.note
        }

        fn at_field(&self) -> Option<&str> {
            self.at
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_timestamp_accepts_store_formats() {
        let expected = at(2024, 1, 1, 10);
        assert_eq!(parse_timestamp("2024-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T10:00:00.000+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 10:00:00+00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01"), Some(at(2024, 1, 1, 0)));
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45T00:00:00Z"), None);
    }

    #[test]
    fn filter_by_text_empty_query_is_identity() {
        let rows = vec![
            Row::text("Sunset", None),
            Row::text("mountain", None),
            Row::text("", None),
        ];
        let kept = filter_by_text(&rows, "", &[Row::text_field]);
        assert_eq!(kept, rows.iter().collect::<Vec<_>>());
        let kept = filter_by_text(&rows, "   ", &[Row::text_field]);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn filter_by_text_matches_any_field_case_insensitively() {
        let rows = vec![
            Row::text("A Red Fox", None),
            Row::text("blue whale", Some("seen at the FOX river")),
            Row::text("green tree", None),
            Row::text("foxglove", None),
        ];
        let kept = filter_by_text(&rows, "fOx", &[Row::text_field, Row::note_field]);
        let texts: Vec<&str> = kept.iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["A Red Fox", "blue whale", "foxglove"]);
    }

    #[test]
    fn filter_by_window_includes_lower_bound_and_counts_bad_timestamps() {
        let rows = vec![
            Row::new("a", "2024-01-03T12:00:00Z"), // exactly now - 7d
            Row::new("b", "2024-01-03T11:59:59Z"), // just outside
            Row::new("c", "2024-01-10T12:00:00Z"), // exactly now
            Row::new("d", "2024-01-10T12:00:01Z"), // future
            Row::new("e", "not a date"),
        ];
        let result = filter_by_window(&rows, 7, Row::at_field, at(2024, 1, 10, 12));
        let users: Vec<_> = result.records.iter().filter_map(|r| r.user).collect();
        assert_eq!(users, vec!["a", "c"]);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn filter_by_days_matches_bucket_span() {
        let rows = vec![
            Row::new("a", "2024-03-03T18:00:00Z"), // day before the first bucket
            Row::new("b", "2024-03-04T00:00:00Z"), // first bucket, midnight
            Row::new("c", "2024-03-10T11:00:00Z"),
            Row::new("d", "2024-03-10T13:00:00Z"), // after now
            Row::new("e", ""),
        ];
        let now = at(2024, 3, 10, 12);
        let result = filter_by_days(&rows, 7, Row::at_field, now);
        let users: Vec<_> = result.records.iter().filter_map(|r| r.user).collect();
        assert_eq!(users, vec!["b", "c"]);
        assert_eq!(result.skipped, 1);

        let series = bucket_by_day(&rows, 7, Row::at_field, Row::user_field, now);
        assert_eq!(series.buckets[0].date, date(2024, 3, 4));
        let bucketed: usize = series.buckets.iter().map(|b| b.images).sum();
        // "d" is on today's date, so the buckets still count it.
        assert_eq!(bucketed, result.records.len() + 1);
        let bucketed_kept: usize =
            bucket_by_day(result.records.iter().copied(), 7, Row::at_field, Row::user_field, now)
                .buckets
                .iter()
                .map(|b| b.images)
                .sum();
        assert_eq!(bucketed_kept, result.records.len());
    }

    #[test]
    fn filter_by_days_with_empty_window_keeps_nothing() {
        let rows = vec![Row::new("a", "2024-03-10T11:00:00Z"), Row::new("b", "nope")];
        let result = filter_by_days(&rows, 0, Row::at_field, at(2024, 3, 10, 12));
        assert!(result.records.is_empty());
        assert_eq!(result.skipped, 1);
        assert_eq!(first_bucket_start(0, at(2024, 3, 10, 12)), None);
        assert_eq!(first_bucket_start(1, at(2024, 3, 10, 12)), Some(at(2024, 3, 10, 0)));
    }

    #[test]
    fn filter_by_window_accepts_arbitrary_lengths() {
        let rows = vec![Row::new("a", "2023-06-01T00:00:00Z")];
        let now = at(2024, 1, 1, 0);
        assert_eq!(filter_by_window(&rows, 365, Row::at_field, now).records.len(), 1);
        assert_eq!(filter_by_window(&rows, 90, Row::at_field, now).records.len(), 0);
    }

    #[test]
    fn bucket_by_day_returns_one_entry_per_day_without_gaps() {
        let now = at(2024, 3, 1, 8);
        for window in [0u32, 1, 7, 30, 90] {
            let series = bucket_by_day(&Vec::<Row>::new(), window, Row::at_field, Row::user_field, now);
            assert_eq!(series.buckets.len(), window as usize);
            for pair in series.buckets.windows(2) {
                assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
            }
            if let Some(last) = series.buckets.last() {
                assert_eq!(last.date, date(2024, 3, 1));
            }
        }
    }

    #[test]
    fn bucket_by_day_counts_distinct_users_per_day() {
        let rows = vec![
            Row::new("a", "2024-01-01T10:00:00Z"),
            Row::new("b", "2024-01-01T12:00:00Z"),
        ];
        let series = bucket_by_day(&rows, 1, Row::at_field, Row::user_field, at(2024, 1, 1, 23));
        assert_eq!(
            series.buckets,
            vec![DailyBucket {
                date: date(2024, 1, 1),
                users: 2,
                images: 2,
            }]
        );
    }

    #[test]
    fn bucket_by_day_uses_utc_dates() {
        // 23:30 at UTC-05:00 is the next UTC day.
        let rows = vec![Row::new("a", "2024-01-01T23:30:00-05:00")];
        let series = bucket_by_day(&rows, 2, Row::at_field, Row::user_field, at(2024, 1, 2, 12));
        assert_eq!(series.buckets[0].images, 0);
        assert_eq!(series.buckets[1].images, 1);
    }

    #[test]
    fn bucket_by_day_skips_unplaceable_records() {
        let rows = vec![
            Row::new("a", "2024-01-02T10:00:00Z"),
            Row::new("b", "garbage"),
            Row {
                at: None,
                ..Row::new("c", "")
            },
            Row::new("d", "2023-12-01T00:00:00Z"), // outside window, not skipped
        ];
        let series = bucket_by_day(&rows, 3, Row::at_field, Row::user_field, at(2024, 1, 3, 0));
        assert_eq!(series.skipped, 2);
        let total: usize = series.buckets.iter().map(|b| b.images).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn export_csv_matches_fixed_layout() {
        let rows = vec![
            Row::new("a", "2024-01-01T01:00:00Z"),
            Row::new("a", "2024-01-01T02:00:00Z"),
            Row::new("b", "2024-01-03T09:00:00Z"),
        ];
        let series = bucket_by_day(&rows, 3, Row::at_field, Row::user_field, at(2024, 1, 3, 18));
        let csv = export_csv(&series.buckets).unwrap();
        assert_eq!(
            csv,
            "Date,Users,Images\n2024-01-01,1,2\n2024-01-02,0,0\n2024-01-03,1,1"
        );
    }

    #[test]
    fn export_csv_of_empty_series_is_header_only() {
        assert_eq!(export_csv(&[]).unwrap(), "Date,Users,Images");
    }

    #[test]
    fn truncate_text_marks_cut_and_respects_char_boundaries() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_text("a long prompt text", 6), "a long...");
        assert_eq!(truncate_text("日本語のプロンプト", 3), "日本語...");
    }

    #[test]
    fn top_by_frequency_orders_by_count_then_first_seen() {
        let rows = vec![
            Row::text("cat", None),
            Row::text("dog", None),
            Row::text("bird", None),
            Row::text("dog", None),
            Row::text("cat", None),
            Row::text("fish", None),
            Row::text("dog", None),
        ];
        let top = top_by_frequency(&rows, |r| Some(r.text.to_string()), 3);
        assert_eq!(
            top,
            vec![
                RankedEntry { key: "dog".into(), count: 3 },
                RankedEntry { key: "cat".into(), count: 2 },
                RankedEntry { key: "bird".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn top_by_frequency_respects_limit_and_monotonic_counts() {
        let rows: Vec<Row> = ["a", "b", "a", "c", "d", "a", "b"]
            .into_iter()
            .map(|t| Row::text(t, None))
            .collect();
        for limit in 0..6 {
            let top = top_by_frequency(&rows, |r| Some(r.text.to_string()), limit);
            assert!(top.len() <= limit);
            assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
        }
        assert_eq!(top_by_frequency(&rows, |r| Some(r.text.to_string()), 10).len(), 4);
    }

    #[test]
    fn top_by_frequency_groups_truncated_keys() {
        let rows = vec![
            Row::text("a castle on a hill at dawn", None),
            Row::text("a castle on a hill at dusk", None),
        ];
        let top = top_by_frequency(&rows, |r| Some(truncate_text(r.text, 15)), 5);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].key, "a castle on a h...");
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn monthly_growth_omits_empty_months() {
        let rows = vec![
            Row::new("a", "2024-01-05T00:00:00Z"),
            Row::new("b", "2024-01-20T00:00:00Z"),
            Row::new("c", "2024-03-02T00:00:00Z"),
            Row::new("d", "bad"),
        ];
        let series = monthly_growth(&rows, Row::at_field, 6);
        assert_eq!(
            series.months,
            vec![
                MonthlyCount {
                    month: "2024-01".into(),
                    label: "Jan 2024".into(),
                    count: 2,
                },
                MonthlyCount {
                    month: "2024-03".into(),
                    label: "Mar 2024".into(),
                    count: 1,
                },
            ]
        );
        assert_eq!(series.skipped, 1);
    }

    #[test]
    fn monthly_growth_keeps_most_recent_months() {
        let rows = vec![
            Row::new("a", "2023-11-01T00:00:00Z"),
            Row::new("b", "2023-12-01T00:00:00Z"),
            Row::new("c", "2024-01-01T00:00:00Z"),
        ];
        let series = monthly_growth(&rows, Row::at_field, 2);
        let months: Vec<&str> = series.months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01"]);
    }

    #[test]
    fn distinct_count_ignores_missing_keys() {
        let rows = vec![
            Row::new("a", "2024-01-01"),
            Row::new("a", "2024-01-02"),
            Row::new("b", "2024-01-02"),
            Row::text("no user", None),
        ];
        assert_eq!(distinct_count(&rows, Row::user_field), 2);
    }

    #[test]
    fn mean_per_day_guards_zero_days() {
        assert_eq!(mean_per_day(10, 0), 0.0);
        assert_eq!(mean_per_day(0, 7), 0.0);
        assert_eq!(mean_per_day(14, 7), 2.0);
    }

    #[test]
    fn aggregation_is_idempotent_and_leaves_input_untouched() {
        let rows = vec![
            Row::new("a", "2024-01-01T10:00:00Z"),
            Row::new("b", "2024-01-02T10:00:00Z"),
            Row::new("a", "oops"),
        ];
        let snapshot = rows.clone();
        let now = at(2024, 1, 2, 20);

        let first = bucket_by_day(&rows, 7, Row::at_field, Row::user_field, now);
        let second = bucket_by_day(&rows, 7, Row::at_field, Row::user_field, now);
        assert_eq!(first, second);
        assert_eq!(export_csv(&first.buckets).unwrap(), export_csv(&second.buckets).unwrap());
        assert_eq!(
            monthly_growth(&rows, Row::at_field, 3),
            monthly_growth(&rows, Row::at_field, 3)
        );
        assert_eq!(rows, snapshot);
    }
}
