// src/header/patterns.rs
//! Recording open/close timestamps as written by different software eras.
//!
//! Older files carry `## Time Opened` / `## Time Closed` comment lines, newer
//! ones `-TimeCreated` / `-TimeClosed` properties, a few write both dates on a
//! single line and some never record a close time at all.

use chrono::{NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Opened/closed pair found in a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingDates {
    pub opened: NaiveDateTime,
    pub closed: Option<NaiveDateTime>,
}

enum DatePattern {
    SeparateLines { open: Regex, close: Regex },
    Combined(Regex),
    OpenOnly(Regex),
}

const HASH_OPENED: &str = r"(?m)^## (?:Time|Date) Opened:? \((?:m/d/y|mm/dd/yyy)\):?[ \t]+(?P<date>\S+)[ \t]+(?:At Time:|\(h:m:s\.ms\))[ \t]+(?P<time>\S+)[ \t]*$";
const HASH_CLOSED: &str = r"(?m)^## (?:Time|Date) Closed:? \((?:m/d/y|mm/dd/yyy)\):?[ \t]+(?P<date>\S+)[ \t]+(?:At Time:|\(h:m:s\.ms\))[ \t]+(?P<time>\S+)[ \t]*$";
const PROP_OPENED: &str = r"(?m)^-TimeCreated[ \t]+(?P<date>\S+)[ \t]+(?P<time>\S+)";
const PROP_CLOSED: &str = r"(?m)^-TimeClosed[ \t]+(?P<date>\S+)[ \t]+(?P<time>\S+)";
const COMBINED: &str = r"(?m)^## (?:Time|Date) Opened:? \((?:m/d/y|mm/dd/yyy)\):?[ \t]+(?P<open_date>\S+)[ \t]+At Time:[ \t]+(?P<open_time>\S+)[ \t]+(?:## )?(?:Time |Date )?Closed:? \((?:m/d/y|mm/dd/yyy)\):?[ \t]+(?P<close_date>\S+)[ \t]+At Time:[ \t]+(?P<close_time>\S+)";

fn compile(pattern: &str) -> Regex {
    // The patterns are literals above; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid date pattern {pattern:?}: {e}"))
}

static DATE_PATTERNS: LazyLock<Vec<(&'static str, DatePattern)>> = LazyLock::new(|| {
    vec![
        (
            "comment lines",
            DatePattern::SeparateLines { open: compile(HASH_OPENED), close: compile(HASH_CLOSED) },
        ),
        (
            "property lines",
            DatePattern::SeparateLines { open: compile(PROP_OPENED), close: compile(PROP_CLOSED) },
        ),
        ("combined line", DatePattern::Combined(compile(COMBINED))),
        ("comment open only", DatePattern::OpenOnly(compile(HASH_OPENED))),
        ("property open only", DatePattern::OpenOnly(compile(PROP_OPENED))),
    ]
});

static FILE_NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^## File Name:?[ \t]+(?P<name>.+?)[ \t]*$"));

fn captured(caps: &Captures<'_>, date: &str, time: &str) -> Option<NaiveDateTime> {
    parse_date_time(caps.name(date)?.as_str(), caps.name(time)?.as_str())
}

fn first_date(re: &Regex, text: &str) -> Option<NaiveDateTime> {
    re.captures(text).and_then(|c| captured(&c, "date", "time"))
}

/// Try every pattern in order; the first complete match wins.
pub fn find_recording_dates(text: &str) -> Option<RecordingDates> {
    for (name, pattern) in DATE_PATTERNS.iter() {
        let found = match pattern {
            DatePattern::SeparateLines { open, close } => {
                match (first_date(open, text), first_date(close, text)) {
                    (Some(opened), Some(closed)) => Some(RecordingDates { opened, closed: Some(closed) }),
                    _ => None,
                }
            }
            DatePattern::Combined(re) => re.captures(text).and_then(|c| {
                let opened = captured(&c, "open_date", "open_time")?;
                let closed = captured(&c, "close_date", "close_time")?;
                Some(RecordingDates { opened, closed: Some(closed) })
            }),
            DatePattern::OpenOnly(open) => {
                first_date(open, text).map(|opened| RecordingDates { opened, closed: None })
            }
        };
        if found.is_some() {
            log::debug!("recording dates matched {name} pattern");
            return found;
        }
    }
    None
}

/// File name from the `## File Name` comment line of older headers.
pub fn find_file_name(text: &str) -> Option<String> {
    FILE_NAME_LINE
        .captures(text)
        .and_then(|c| c.name("name"))
        .map(|m| m.as_str().to_string())
}

/// Parse `m/d/y` or `y/m/d` plus `h:m:s[.frac]`.
pub fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let parts: Vec<u32> = date
        .split('/')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<Vec<u32>>>()?;
    let [a, b, c] = parts[..] else { return None };

    let (year, month, day) = if date.split('/').next()?.trim().len() == 4 {
        (a as i32, b, c)
    } else {
        let year = if c < 100 { c + 2000 } else { c };
        (year as i32, a, b)
    };

    let mut fields = time.split(':');
    let hour: u32 = fields.next()?.parse().ok()?;
    let minute: u32 = fields.next()?.parse().ok()?;
    let seconds = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    let (whole, frac) = seconds.split_once('.').unwrap_or((seconds, ""));
    let second: u32 = whole.parse().ok()?;
    let nanos = if frac.is_empty() {
        0
    } else {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse().ok()?
    };

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_nano_opt(hour, minute, second, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_micro_opt(h, mi, s, micro)
            .unwrap()
    }

    #[test]
    fn test_fractional_seconds_are_decimal() {
        assert_eq!(parse_date_time("10/4/2003", "10:3:0.578"), Some(dt(2003, 10, 4, 10, 3, 0, 578_000)));
        assert_eq!(parse_date_time("1/1/2001", "0:0:0.0"), Some(dt(2001, 1, 1, 0, 0, 0, 0)));
    }

    #[test]
    fn test_year_first_dates() {
        assert_eq!(parse_date_time("2017/02/16", "17:56:04"), Some(dt(2017, 2, 16, 17, 56, 4, 0)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_date_time("13/40/2003", "10:3:0"), None);
        assert_eq!(parse_date_time("10/4/2003", "10:3"), None);
        assert_eq!(parse_date_time("File", "was"), None);
    }

    #[test]
    fn test_separate_comment_lines() {
        let text = "######## Neuralynx Data File Header\n\
                    ## File Name: C:\\CheetahData\\CSC5.ncs\n\
                    ## Time Opened (m/d/y): 1/1/2001  At Time: 0:0:0.0\n\
                    ## Time Closed (m/d/y): 1/1/2001  At Time: 0:0:0.0\n";
        let dates = find_recording_dates(text).unwrap();
        assert_eq!(dates.opened, dt(2001, 1, 1, 0, 0, 0, 0));
        assert_eq!(dates.closed, Some(dt(2001, 1, 1, 0, 0, 0, 0)));
        assert_eq!(find_file_name(text).as_deref(), Some("C:\\CheetahData\\CSC5.ncs"));
    }

    #[test]
    fn test_neuraview_date_lines() {
        let text = "## Date Opened: (mm/dd/yyy): 12/14/2015 At Time: 15:58:32\n\
                    ## Date Closed: (mm/dd/yyy): 12/14/2015 At Time: 15:58:32\n";
        let dates = find_recording_dates(text).unwrap();
        assert_eq!(dates.opened, dt(2015, 12, 14, 15, 58, 32, 0));
        assert_eq!(dates.closed, Some(dt(2015, 12, 14, 15, 58, 32, 0)));
    }

    #[test]
    fn test_property_lines() {
        let text = "-TimeCreated 2017/02/16 17:56:04\n-TimeClosed 2017/02/16 18:01:18\n";
        let dates = find_recording_dates(text).unwrap();
        assert_eq!(dates.opened, dt(2017, 2, 16, 17, 56, 4, 0));
        assert_eq!(dates.closed, Some(dt(2017, 2, 16, 18, 1, 18, 0)));
    }

    #[test]
    fn test_combined_line() {
        let text = "## Time Opened (m/d/y): 6/6/2019 At Time: 17:46:39.125 Closed (m/d/y): 6/6/2019 At Time: 18:00:00\n";
        let dates = find_recording_dates(text).unwrap();
        assert_eq!(dates.opened, dt(2019, 6, 6, 17, 46, 39, 125_000));
        assert_eq!(dates.closed, Some(dt(2019, 6, 6, 18, 0, 0, 0)));
    }

    #[test]
    fn test_open_only() {
        let text = "## Time Opened (m/d/y): 10/4/2003  At Time: 10:3:0.578\n-CheetahRev 4.0.2\n";
        let dates = find_recording_dates(text).unwrap();
        assert_eq!(dates.opened, dt(2003, 10, 4, 10, 3, 0, 578_000));
        assert_eq!(dates.closed, None);
    }

    #[test]
    fn test_unparsable_close_falls_back_to_open_only() {
        let text = "-TimeCreated 2017/02/16 17:56:04\n-TimeClosed File was not closed properly\n";
        let dates = find_recording_dates(text).unwrap();
        assert_eq!(dates.closed, None);
    }

    #[test]
    fn test_no_dates() {
        assert_eq!(find_recording_dates("-FileType Event\n-ApplicationName Pegasus\n"), None);
    }
}
