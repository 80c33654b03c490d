//! Calendar-day segmentation under an IANA timezone.

use chrono::{NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use serde::Serialize;

use crate::bar::Bar;
use crate::constant::AnalysisError;

pub fn parse_timezone(name: &str) -> Result<Tz, AnalysisError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| AnalysisError::InvalidTimezone(name.to_string()))
}

pub fn local_date(bar: &Bar, tz: Tz) -> NaiveDate {
    bar.time.with_timezone(&tz).date_naive()
}

/// Contiguous run of bars sharing one local trading date. Indexes point into the
/// bar slice the session was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Session {
    pub date: NaiveDate,
    pub start: usize,
    pub end: usize,
    pub opening_index: usize,
}

impl Session {
    pub fn bars<'a>(&self, bars: &'a [Bar]) -> &'a [Bar] {
        &bars[self.start..self.end]
    }

    pub fn opening_bar<'a>(&self, bars: &'a [Bar]) -> &'a Bar {
        &bars[self.opening_index]
    }
}

/// Groups bars by local date without locating opening bars; `opening_index`
/// defaults to each session's first bar.
pub fn segment_days(bars: &[Bar], tz: Tz) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();
    for (idx, bar) in bars.iter().enumerate() {
        let date = local_date(bar, tz);
        match sessions.last_mut() {
            Some(current) if current.date == date => current.end = idx + 1,
            _ => sessions.push(Session {
                date,
                start: idx,
                end: idx + 1,
                opening_index: idx,
            }),
        }
    }
    sessions
}

pub fn segment_sessions(bars: &[Bar], tz: Tz, open_time: NaiveTime) -> Vec<Session> {
    let mut sessions = segment_days(bars, tz);
    for session in &mut sessions {
        if let Some(offset) = session
            .bars(bars)
            .iter()
            .position(|bar| is_open_bar(bar, tz, open_time))
        {
            session.opening_index = session.start + offset;
        }
    }
    sessions
}

pub fn latest_session(sessions: &[Session]) -> Result<&Session, AnalysisError> {
    sessions
        .last()
        .ok_or_else(|| AnalysisError::InsufficientData("no sessions in bar sequence".to_string()))
}

fn is_open_bar(bar: &Bar, tz: Tz, open_time: NaiveTime) -> bool {
    let local = bar.time.with_timezone(&tz);
    local.hour() == open_time.hour() && local.minute() == open_time.minute()
}
