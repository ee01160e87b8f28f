//! Future axis labels.
//!
//! The sampling interval is read from the last two labels. Parsers are tried
//! in a fixed order and the first that understands both labels wins:
//!
//! 1. date/time instants (RFC 3339, naive ISO-8601, `MM.DD HH:MM`, epoch ms),
//!    projected in the same textual format as the input;
//! 2. `HH:MM` clock labels, wrapping at midnight;
//! 3. otherwise `+1`, `+2`, ...
//!
//! With fewer than two labels there is no interval, so `Future 1`, `Future 2`, ...
//! are produced instead.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Naive formats tried in order; the matching one is reused for output
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Labels produced for ranges spanning several days carry no year
const MONTH_DAY_FORMAT: &str = "%m.%d %H:%M";

/// Leap year so that `02.29` parses
const MONTH_DAY_YEAR: i32 = 2000;

#[derive(Debug, Clone, PartialEq)]
enum LabelStep {
    Zoned {
        last: DateTime<FixedOffset>,
        step_ms: i64,
        seconds: SecondsFormat,
        zulu: bool,
    },
    Naive {
        last: NaiveDateTime,
        step_ms: i64,
        format: &'static str,
    },
    Epoch {
        last: i64,
        step_ms: i64,
    },
    Clock {
        last: i64,
        step_minutes: i64,
    },
}

impl LabelStep {
    fn label(&self, step: usize) -> Option<String> {
        let step = i64::try_from(step).ok()?;
        match self {
            LabelStep::Zoned {
                last,
                step_ms,
                seconds,
                zulu,
            } => {
                let next = last.checked_add_signed(delta(*step_ms, step)?)?;
                Some(next.to_rfc3339_opts(*seconds, *zulu))
            }
            LabelStep::Naive {
                last,
                step_ms,
                format,
            } => {
                let next = last.checked_add_signed(delta(*step_ms, step)?)?;
                Some(next.format(format).to_string())
            }
            LabelStep::Epoch { last, step_ms } => {
                let next = last.checked_add(step_ms.checked_mul(step)?)?;
                Some(next.to_string())
            }
            LabelStep::Clock { last, step_minutes } => {
                let minutes = step_minutes
                    .checked_mul(step)?
                    .checked_add(*last)?
                    .rem_euclid(MINUTES_PER_DAY);
                Some(format!("{:02}:{:02}", minutes / 60, minutes % 60))
            }
        }
    }
}

fn delta(step_ms: i64, step: i64) -> Option<TimeDelta> {
    TimeDelta::try_milliseconds(step_ms.checked_mul(step)?)
}

/// Generate `points` labels continuing `existing` at its detected interval.
pub fn extrapolate_timestamps(existing: &[String], points: usize) -> Vec<String> {
    let [.., previous, last] = existing else {
        return (1..=points).map(|i| format!("Future {i}")).collect();
    };

    match detect_step(previous, last) {
        Some(step) => (1..=points)
            .map(|i| step.label(i).unwrap_or_else(|| format!("+{i}")))
            .collect(),
        None => {
            tracing::debug!(
                "Unrecognised timestamp labels {:?} / {:?}, using placeholders",
                previous,
                last
            );
            (1..=points).map(|i| format!("+{i}")).collect()
        }
    }
}

fn detect_step(previous: &str, last: &str) -> Option<LabelStep> {
    zoned_step(previous, last)
        .or_else(|| naive_step(previous, last))
        .or_else(|| date_step(previous, last))
        .or_else(|| month_day_step(previous, last))
        .or_else(|| epoch_step(previous, last))
        .or_else(|| clock_step(previous, last))
}

fn zoned_step(previous: &str, last: &str) -> Option<LabelStep> {
    let first = DateTime::parse_from_rfc3339(previous).ok()?;
    let second = DateTime::parse_from_rfc3339(last).ok()?;
    let seconds = fraction_format(last);
    Some(LabelStep::Zoned {
        last: second,
        step_ms: (second - first).num_milliseconds(),
        seconds,
        zulu: last.ends_with('Z') || last.ends_with('z'),
    })
}

/// Sub-second precision of an RFC 3339 label, by its fraction digits
fn fraction_format(label: &str) -> SecondsFormat {
    let digits = label
        .split_once('.')
        .map(|(_, rest)| rest.bytes().take_while(u8::is_ascii_digit).count())
        .unwrap_or(0);
    match digits {
        0 => SecondsFormat::Secs,
        1..=3 => SecondsFormat::Millis,
        4..=6 => SecondsFormat::Micros,
        _ => SecondsFormat::Nanos,
    }
}

fn naive_step(previous: &str, last: &str) -> Option<LabelStep> {
    NAIVE_FORMATS.iter().copied().find_map(|format| {
        let first = NaiveDateTime::parse_from_str(previous, format).ok()?;
        let second = NaiveDateTime::parse_from_str(last, format).ok()?;
        Some(LabelStep::Naive {
            last: second,
            step_ms: (second - first).num_milliseconds(),
            format,
        })
    })
}

fn date_step(previous: &str, last: &str) -> Option<LabelStep> {
    let first = NaiveDate::parse_from_str(previous, DATE_FORMAT).ok()?;
    let second = NaiveDate::parse_from_str(last, DATE_FORMAT).ok()?;
    let second = second.and_hms_opt(0, 0, 0)?;
    let first = first.and_hms_opt(0, 0, 0)?;
    Some(LabelStep::Naive {
        last: second,
        step_ms: (second - first).num_milliseconds(),
        format: DATE_FORMAT,
    })
}

/// `MM.DD HH:MM` labels. A backwards step means the year rolled over.
fn month_day_step(previous: &str, last: &str) -> Option<LabelStep> {
    let parse = |label: &str, year: i32| {
        NaiveDateTime::parse_from_str(&format!("{year}.{label}"), "%Y.%m.%d %H:%M").ok()
    };
    let first = parse(previous, MONTH_DAY_YEAR)?;
    let mut second = parse(last, MONTH_DAY_YEAR)?;
    if second < first {
        second = parse(last, MONTH_DAY_YEAR + 1)?;
    }
    Some(LabelStep::Naive {
        last: second,
        step_ms: (second - first).num_milliseconds(),
        format: MONTH_DAY_FORMAT,
    })
}

fn epoch_step(previous: &str, last: &str) -> Option<LabelStep> {
    let first = previous.parse::<i64>().ok()?;
    let second = last.parse::<i64>().ok()?;
    Some(LabelStep::Epoch {
        last: second,
        step_ms: second.checked_sub(first)?,
    })
}

fn clock_minutes(label: &str) -> Option<i64> {
    let (hours, minutes) = label.split_once(':')?;
    let is_two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !is_two_digits(hours) || !is_two_digits(minutes) {
        return None;
    }
    Some(hours.parse::<i64>().ok()? * 60 + minutes.parse::<i64>().ok()?)
}

fn clock_step(previous: &str, last: &str) -> Option<LabelStep> {
    let first = clock_minutes(previous)?;
    let second = clock_minutes(last)?;
    Some(LabelStep::Clock {
        last: second,
        step_minutes: second - first,
    })
}
