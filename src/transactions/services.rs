//! Aggregation over already-fetched transactions and the calendar-day arithmetic
//! used by the date filters. Nothing here does I/O.

use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
};

use super::repo_types::{Transaction, TransactionType};

/// Income minus expenses. Zero for an empty list.
pub fn balance(txs: &[Transaction]) -> f64 {
    txs.iter().fold(0.0, |acc, tx| match tx.kind {
        TransactionType::Income => acc + tx.amount,
        TransactionType::Expense => acc - tx.amount,
    })
}

/// Sum of amounts of the given type. Zero when nothing matches.
pub fn total_by_type(txs: &[Transaction], kind: TransactionType) -> f64 {
    txs.iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

/// Parses `YYYY-MM-DD`.
pub fn parse_day(s: &str) -> Option<Date> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD`, which means midnight UTC.
pub fn parse_transaction_date(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    OffsetDateTime::parse(s, &Rfc3339)
        .ok()
        .or_else(|| parse_day(s).map(|d| d.midnight().assume_utc()))
}

/// Lower bound and exclusive upper bound of a run of calendar days. A missing
/// upper bound means the run ends on the last representable day.
pub type DayBounds = (OffsetDateTime, Option<OffsetDateTime>);

/// `[day 00:00Z, next day 00:00Z)`.
pub fn day_bounds(day: Date) -> DayBounds {
    (
        day.midnight().assume_utc(),
        day.next_day().map(|d| d.midnight().assume_utc()),
    )
}

/// Half-open bounds covering every instant of the calendar days `start..=end` (UTC).
/// `None` only when `start` is after `end`.
pub fn days_bounds(start: Date, end: Date) -> Option<DayBounds> {
    if start > end {
        return None;
    }
    let (_, until) = day_bounds(end);
    Some((start.midnight().assume_utc(), until))
}

/// Whether `at` falls within `bounds`.
pub fn within(bounds: DayBounds, at: OffsetDateTime) -> bool {
    let (from, until) = bounds;
    from <= at && until.map_or(true, |u| at < u)
}
