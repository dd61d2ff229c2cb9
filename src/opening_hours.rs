// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::Error;

const MINUTES_PER_DAY: u32 = 24 * 60;
const WEEKDAY_NAMES: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Result of evaluating [OpeningHours] at a specific moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpeningState {
    Open,
    Closed,
    Unknown,
}

/// Parsed subset of the [OSM opening_hours](https://wiki.openstreetmap.org/wiki/Key:opening_hours)
/// syntax, as used by conditional access tags.
///
/// Supported rules are separated by `;` and consist of optional weekdays
/// (`Mo`, `Mo-Fr`, `Fr-Mo`, `Sa,Su`), optional time spans (`08:00-12:00,13:00-17:00`,
/// spans may extend past midnight like `22:00-06:00`) and an optional state
/// (`open`, `off`, `closed` or `unknown`). `24/7` is accepted as a whole rule.
/// Later rules override earlier ones. Moments not covered by any rule are closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningHours {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    /// Indexed by days from Monday.
    weekdays: [bool; 7],
    spans: Vec<TimeSpan>,
    state: OpeningState,
}

/// Minutes since midnight; `end <= start` means the span wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeSpan {
    start: u32,
    end: u32,
}

impl OpeningHours {
    /// Hours covering every moment, open.
    pub fn always() -> Self {
        Self {
            rules: vec![Rule {
                weekdays: [true; 7],
                spans: Vec::default(),
                state: OpeningState::Open,
            }],
        }
    }

    /// Evaluates the hours at the provided local time.
    pub fn state_at(&self, time: NaiveDateTime) -> OpeningState {
        let day = time.weekday().num_days_from_monday() as usize;
        let previous_day = (day + 6) % 7;
        let minute = time.hour() * 60 + time.minute();

        self.rules
            .iter()
            .rev()
            .find(|rule| rule.covers(day, previous_day, minute))
            .map(|rule| rule.state)
            .unwrap_or(OpeningState::Closed)
    }
}

impl Rule {
    fn covers(&self, day: usize, previous_day: usize, minute: u32) -> bool {
        if self.spans.is_empty() {
            return self.weekdays[day];
        }

        self.spans.iter().any(|span| {
            if span.start < span.end {
                self.weekdays[day] && span.start <= minute && minute < span.end
            } else {
                // The part after midnight belongs to the day on which the span started.
                (self.weekdays[day] && minute >= span.start)
                    || (self.weekdays[previous_day] && minute < span.end)
            }
        })
    }
}

impl FromStr for OpeningHours {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &'static str| Error::MalformedOpeningHours {
            rule: s.to_string(),
            reason,
        };

        let rules = s
            .split(';')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| parse_rule(r).map_err(malformed))
            .collect::<Result<Vec<_>, _>>()?;

        if rules.is_empty() {
            return Err(malformed("no rules"));
        }

        Ok(Self { rules })
    }
}

fn parse_rule(rule: &str) -> Result<Rule, &'static str> {
    if rule == "24/7" {
        return Ok(Rule {
            weekdays: [true; 7],
            spans: Vec::default(),
            state: OpeningState::Open,
        });
    }

    let mut weekdays: Option<[bool; 7]> = None;
    let mut spans = Vec::default();
    let mut state: Option<OpeningState> = None;

    for token in rule.split_whitespace() {
        if state.is_some() {
            return Err("tokens after the rule state");
        }

        match token {
            "open" => state = Some(OpeningState::Open),
            "off" | "closed" => state = Some(OpeningState::Closed),
            "unknown" => state = Some(OpeningState::Unknown),
            _ if token.contains(':') => {
                for span in token.split(',').filter(|s| !s.is_empty()) {
                    spans.push(parse_span(span)?);
                }
            }
            _ => {
                if weekdays.is_some() || !spans.is_empty() {
                    return Err("weekdays must precede time spans");
                }
                weekdays = Some(parse_weekdays(token)?);
            }
        }
    }

    Ok(Rule {
        weekdays: weekdays.unwrap_or([true; 7]),
        spans,
        state: state.unwrap_or(OpeningState::Open),
    })
}

fn parse_weekdays(token: &str) -> Result<[bool; 7], &'static str> {
    let mut days = [false; 7];

    for part in token.split(',').filter(|s| !s.is_empty()) {
        match part.split_once('-') {
            Some((from, to)) => {
                let from = parse_weekday(from)?;
                let to = parse_weekday(to)?;
                let mut day = from;
                loop {
                    days[day] = true;
                    if day == to {
                        break;
                    }
                    day = (day + 1) % 7;
                }
            }
            None => days[parse_weekday(part)?] = true,
        }
    }

    Ok(days)
}

fn parse_weekday(name: &str) -> Result<usize, &'static str> {
    WEEKDAY_NAMES
        .iter()
        .position(|&n| n == name)
        .ok_or("unrecognized weekday")
}

fn parse_span(span: &str) -> Result<TimeSpan, &'static str> {
    let (start, end) = span.split_once('-').ok_or("time span without '-'")?;
    let start = parse_time(start)?;
    let end = parse_time(end)?;

    if start >= MINUTES_PER_DAY {
        return Err("time span starting at 24:00");
    }

    Ok(TimeSpan {
        start,
        end: end % MINUTES_PER_DAY,
    })
}

fn parse_time(time: &str) -> Result<u32, &'static str> {
    let (h, m) = time.split_once(':').ok_or("time without ':'")?;
    let h: u32 = h.parse().map_err(|_| "invalid hour")?;
    let m: u32 = m.parse().map_err(|_| "invalid minute")?;

    if m >= 60 || h > 24 || (h == 24 && m > 0) {
        return Err("time out of range");
    }

    Ok(h * 60 + m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// 2024-03-04 is a Monday.
    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4 + day)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid test date")
    }

    fn parse(s: &str) -> OpeningHours {
        s.parse().expect("valid opening hours")
    }

    #[test]
    fn night_span_wraps_past_midnight() {
        let h = parse("22:00-06:00");
        assert_eq!(h.state_at(at(0, 23, 0)), OpeningState::Open);
        assert_eq!(h.state_at(at(1, 5, 59)), OpeningState::Open);
        assert_eq!(h.state_at(at(1, 6, 0)), OpeningState::Closed);
        assert_eq!(h.state_at(at(1, 12, 0)), OpeningState::Closed);
    }

    #[test]
    fn weekdays_and_spans() {
        let h = parse("Mo-Fr 08:00-12:00,13:00-17:00; Sa 10:00-14:00");
        assert_eq!(h.state_at(at(0, 9, 0)), OpeningState::Open);
        assert_eq!(h.state_at(at(0, 12, 30)), OpeningState::Closed);
        assert_eq!(h.state_at(at(4, 16, 59)), OpeningState::Open);
        assert_eq!(h.state_at(at(5, 11, 0)), OpeningState::Open);
        assert_eq!(h.state_at(at(5, 15, 0)), OpeningState::Closed);
        assert_eq!(h.state_at(at(6, 11, 0)), OpeningState::Closed);
    }

    #[test]
    fn wrapping_weekday_range_and_night_span() {
        // Friday 22:00 until Saturday 02:00, and Sunday 22:00 until Monday 02:00.
        let h = parse("Fr-Su 22:00-02:00");
        assert_eq!(h.state_at(at(4, 23, 0)), OpeningState::Open);
        assert_eq!(h.state_at(at(5, 1, 0)), OpeningState::Open);
        assert_eq!(h.state_at(at(0, 1, 0)), OpeningState::Open);
        assert_eq!(h.state_at(at(3, 1, 0)), OpeningState::Closed);
        assert_eq!(h.state_at(at(3, 23, 0)), OpeningState::Closed);
    }

    #[test]
    fn later_rules_override() {
        let h = parse("24/7; Su off");
        assert_eq!(h.state_at(at(2, 3, 0)), OpeningState::Open);
        assert_eq!(h.state_at(at(6, 12, 0)), OpeningState::Closed);

        let h = parse("Mo-Su 00:00-24:00; We unknown");
        assert_eq!(h.state_at(at(2, 12, 0)), OpeningState::Unknown);
        assert_eq!(h.state_at(at(3, 12, 0)), OpeningState::Open);
    }

    #[test]
    fn always_open() {
        assert_eq!(OpeningHours::always().state_at(at(3, 3, 33)), OpeningState::Open);
    }

    #[test]
    fn malformed() {
        for s in ["", "  ;  ", "Xx 10:00-12:00", "10:00", "25:00-26:00", "10:00-12:00 Mo", "off Mo"] {
            assert!(
                matches!(s.parse::<OpeningHours>(), Err(Error::MalformedOpeningHours { .. })),
                "{:?} must be rejected",
                s,
            );
        }
    }
}
