//! Time filter
//!
//! Renders the predicate that replaces the `$timeFilter` placeholder of a
//! rendered query, and parses group-by interval strings.
//!
//! # Time bounds
//!
//! ```text
//! now                         -> now()
//! now-6h                      -> now() - 6h
//! now-1w, now-7d/d, now/M     -> epoch ms evaluated against the current time
//! 1665405000000               -> 1665405000000ms
//! 2022-10-10T12:30:00Z        -> 1665405000000ms
//! 2022-10-10 12:30:00[.000]   -> 1665405000000ms   (UTC)
//! ```
//!
//! Date math takes offsets `+N<unit>`/`-N<unit>` and roundings `/<unit>`
//! with units `s m h d w M y`. Rounding goes to the start of the unit for a
//! range start and to its last millisecond for a range end. Weeks start on
//! Monday.

use crate::query::{QueryError, QueryResult, TIME_FILTER};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, Timelike, Utc};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, char, digit1, one_of, space1},
    combinator::{all_consuming, map, map_res, opt, value},
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};
use std::fmt;

/// Unit of a relative time offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    pub fn suffix(self) -> char {
        match self {
            Self::Days => 'd',
            Self::Hours => 'h',
            Self::Minutes => 'm',
            Self::Seconds => 's',
        }
    }
}

/// One end of a dashboard time range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeBound {
    Now,
    Ago { amount: u64, unit: TimeUnit },
    Absolute(DateTime<Utc>),
}

impl TimeBound {
    /// Parse a raw range bound as sent by the dashboard, evaluating date
    /// math against the current time
    pub fn parse(input: &str) -> QueryResult<Self> {
        Self::parse_at(input, Utc::now(), false)
    }

    /// Parse a raw range bound, evaluating date math against `now`.
    /// `round_up` selects the end of a rounded unit rather than its start.
    pub fn parse_at(input: &str, now: DateTime<Utc>, round_up: bool) -> QueryResult<Self> {
        let input = input.trim();
        let invalid = || QueryError::InvalidTimeRange(input.to_string());

        if let Ok((_, bound)) = all_consuming(parse_relative)(input) {
            return Ok(bound);
        }
        if let Ok((_, ops)) = all_consuming(parse_date_math)(input) {
            return evaluate(now, &ops, round_up)
                .map(Self::Absolute)
                .ok_or_else(invalid);
        }
        if let Ok((_, millis)) = all_consuming(parse_millis)(input) {
            return DateTime::from_timestamp_millis(millis)
                .map(Self::Absolute)
                .ok_or_else(invalid);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(Self::Absolute(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(Self::Absolute(naive.and_utc()));
        }

        Err(invalid())
    }

    /// Expression for this bound in a time predicate
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TimeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now => write!(f, "now()"),
            Self::Ago { amount, unit } => write!(f, "now() - {}{}", amount, unit.suffix()),
            Self::Absolute(dt) => write!(f, "{}ms", dt.timestamp_millis()),
        }
    }
}

/// Parse "now" or "now-6h"
fn parse_relative(input: &str) -> IResult<&str, TimeBound> {
    let (input, _) = tag("now")(input)?;
    let (input, offset) = opt(preceded(
        char('-'),
        tuple((map_res(digit1, |s: &str| s.parse::<u64>()), parse_unit)),
    ))(input)?;

    let bound = match offset {
        Some((amount, unit)) => TimeBound::Ago { amount, unit },
        None => TimeBound::Now,
    };
    Ok((input, bound))
}

/// Parse a relative offset unit
fn parse_unit(input: &str) -> IResult<&str, TimeUnit> {
    alt((
        value(TimeUnit::Days, char('d')),
        value(TimeUnit::Hours, char('h')),
        value(TimeUnit::Minutes, char('m')),
        value(TimeUnit::Seconds, char('s')),
    ))(input)
}

/// Calendar unit of a date math step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathOp {
    Shift(i64, MathUnit),
    Round(MathUnit),
}

/// Parse "now" followed by any number of "+1d", "-2w" or "/M" steps
fn parse_date_math(input: &str) -> IResult<&str, Vec<MathOp>> {
    preceded(
        tag("now"),
        many0(alt((
            map(
                tuple((
                    one_of("+-"),
                    map_res(digit1, |s: &str| s.parse::<i64>()),
                    parse_math_unit,
                )),
                |(sign, amount, unit)| {
                    let amount = if sign == '-' { -amount } else { amount };
                    MathOp::Shift(amount, unit)
                },
            ),
            map(preceded(char('/'), parse_math_unit), MathOp::Round),
        ))),
    )(input)
}

fn parse_math_unit(input: &str) -> IResult<&str, MathUnit> {
    alt((
        value(MathUnit::Seconds, char('s')),
        value(MathUnit::Minutes, char('m')),
        value(MathUnit::Hours, char('h')),
        value(MathUnit::Days, char('d')),
        value(MathUnit::Weeks, char('w')),
        value(MathUnit::Months, char('M')),
        value(MathUnit::Years, char('y')),
    ))(input)
}

fn evaluate(now: DateTime<Utc>, ops: &[MathOp], round_up: bool) -> Option<DateTime<Utc>> {
    ops.iter().try_fold(now, |time, op| match *op {
        MathOp::Shift(amount, unit) => shift(time, amount, unit),
        MathOp::Round(unit) if round_up => {
            shift(start_of(time, unit)?, 1, unit)?.checked_sub_signed(Duration::milliseconds(1))
        }
        MathOp::Round(unit) => start_of(time, unit),
    })
}

fn shift(time: DateTime<Utc>, amount: i64, unit: MathUnit) -> Option<DateTime<Utc>> {
    let seconds = match unit {
        MathUnit::Seconds => 1,
        MathUnit::Minutes => 60,
        MathUnit::Hours => 3600,
        MathUnit::Days => 86_400,
        MathUnit::Weeks => 604_800,
        MathUnit::Months | MathUnit::Years => {
            let months = if unit == MathUnit::Years {
                amount.checked_mul(12)?
            } else {
                amount
            };
            let delta = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
            return if months < 0 {
                time.checked_sub_months(delta)
            } else {
                time.checked_add_months(delta)
            };
        }
    };
    time.checked_add_signed(Duration::try_seconds(amount.checked_mul(seconds)?)?)
}

fn start_of(time: DateTime<Utc>, unit: MathUnit) -> Option<DateTime<Utc>> {
    let date = time.date_naive();
    let start = match unit {
        MathUnit::Seconds => time.with_nanosecond(0)?.naive_utc(),
        MathUnit::Minutes => date.and_hms_opt(time.hour(), time.minute(), 0)?,
        MathUnit::Hours => date.and_hms_opt(time.hour(), 0, 0)?,
        MathUnit::Days => date.and_hms_opt(0, 0, 0)?,
        MathUnit::Weeks => {
            let back = Duration::days(i64::from(date.weekday().num_days_from_monday()));
            date.checked_sub_signed(back)?.and_hms_opt(0, 0, 0)?
        }
        MathUnit::Months => date.with_day(1)?.and_hms_opt(0, 0, 0)?,
        MathUnit::Years => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
    };
    Some(start.and_utc())
}

/// Parse epoch milliseconds
fn parse_millis(input: &str) -> IResult<&str, i64> {
    map_res(digit1, |s: &str| s.parse::<i64>())(input)
}

/// Predicate restricting `time` to `[from, to]`
pub fn time_filter(from: &TimeBound, to: &TimeBound) -> String {
    format!("time >= {} and time <= {}", from, to)
}

/// Predicate for raw range bounds
pub fn render_time_filter(from: &str, to: &str) -> QueryResult<String> {
    render_time_filter_at(from, to, Utc::now())
}

/// Predicate for raw range bounds with date math evaluated against `now`
pub fn render_time_filter_at(from: &str, to: &str, now: DateTime<Utc>) -> QueryResult<String> {
    let from = TimeBound::parse_at(from, now, false)?;
    let to = TimeBound::parse_at(to, now, true)?;
    Ok(time_filter(&from, &to))
}

/// Replace every `$timeFilter` placeholder in `sql`
pub fn apply_time_filter(sql: &str, filter: &str) -> String {
    sql.replace(TIME_FILTER, filter)
}

/// Parse "<n> <unit>" where the unit starts with second, minute or hour.
/// Anything else, `$__interval` included, has no fixed duration.
pub fn parse_interval(text: &str) -> Option<Duration> {
    let parsed: IResult<&str, (i64, &str)> = all_consuming(tuple((
        map_res(digit1, |s: &str| s.parse::<i64>()),
        preceded(space1, alpha1),
    )))(text.trim());
    let (_, (amount, unit)) = parsed.ok()?;

    let unit = unit.to_lowercase();
    let seconds = if unit.starts_with("second") {
        1
    } else if unit.starts_with("minute") {
        60
    } else if unit.starts_with("hour") {
        3600
    } else {
        return None;
    };
    amount.checked_mul(seconds).map(Duration::seconds)
}
