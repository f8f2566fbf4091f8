use std::convert::TryFrom;
use std::fmt;

use chrono::Timelike;

use crate::error::ParseError;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Trips are kept by a filter when either end is within this many minutes of the selected time
pub const WINDOW_MINUTES: u16 = 60;

/// Slider value meaning "no filter"
pub const ANY_TIME_SLIDER_VALUE: i64 = -1;

/// A clock time within a day at minute precision, always in `0..1440`.
/// # Examples
/// ```rust
/// use bikeflow::time::MinuteOfDay;
/// assert_eq!(MinuteOfDay::from_hm(1, 30).unwrap().minutes(), 90);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    pub const MIDNIGHT: MinuteOfDay = MinuteOfDay(0);
    pub const LAST: MinuteOfDay = MinuteOfDay(MINUTES_PER_DAY - 1);

    pub fn new(minutes: u16) -> Option<MinuteOfDay> {
        if minutes < MINUTES_PER_DAY {
            Some(MinuteOfDay(minutes))
        } else {
            None
        }
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Option<MinuteOfDay> {
        if minutes > 59 {
            return None;
        }
        Self::new(hours.checked_mul(60)?.checked_add(minutes)?)
    }

    /// The clock minute of a date-time, the date and seconds are discarded
    pub fn of<T: Timelike>(time: &T) -> MinuteOfDay {
        // hour() < 24 and minute() < 60 so this is always in range
        MinuteOfDay((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Distance in minutes on the clock face, without wrapping around midnight
    pub fn distance(self, other: MinuteOfDay) -> u16 {
        if self.0 > other.0 {
            self.0 - other.0
        } else {
            other.0 - self.0
        }
    }

    /// US short time style, eg. `12:05 AM`, `1:30 PM`
    pub fn to_short_time(self) -> String {
        let (hour, meridiem) = match self.hour() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute(), meridiem)
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// # String representations
/// `"0:00"`, `"09:30"` and `"23:59"`
impl std::str::FromStr for MinuteOfDay {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ':');
        let hh = parts.next().ok_or(ParseError::InvalidFormat)?;
        let mm = parts.next().ok_or(ParseError::InvalidFormat)?;
        if hh.is_empty() || hh.len() > 2 || mm.len() != 2 {
            return Err(ParseError::InvalidFormat);
        }
        let hours: u16 = hh.parse()?;
        let minutes: u16 = mm.parse()?;
        MinuteOfDay::from_hm(hours, minutes).ok_or(ParseError::OutOfRange)
    }
}

/// Selects which trips take part in aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFilter {
    Any,
    At(MinuteOfDay),
}

impl Default for TimeFilter {
    fn default() -> Self {
        TimeFilter::Any
    }
}

impl TimeFilter {
    /// Negative values select any time, values past the end of the day are clamped to 23:59
    pub fn from_slider_value(raw: i64) -> TimeFilter {
        if raw < 0 {
            return TimeFilter::Any;
        }
        let minutes = u16::try_from(raw).unwrap_or(u16::MAX);
        match MinuteOfDay::new(minutes) {
            Some(minute) => TimeFilter::At(minute),
            None => {
                tracing::warn!(raw, "slider value past the end of the day, clamping to 23:59");
                TimeFilter::At(MinuteOfDay::LAST)
            }
        }
    }

    pub fn slider_value(self) -> i64 {
        match self {
            TimeFilter::Any => ANY_TIME_SLIDER_VALUE,
            TimeFilter::At(minute) => minute.minutes().into(),
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, TimeFilter::At(_))
    }

    /// A trip is kept if either its start or its end is within the window, inclusive
    pub fn matches(self, start: MinuteOfDay, end: MinuteOfDay) -> bool {
        match self {
            TimeFilter::Any => true,
            TimeFilter::At(t) => {
                start.distance(t) <= WINDOW_MINUTES || end.distance(t) <= WINDOW_MINUTES
            }
        }
    }

    pub fn label(self) -> FilterLabel {
        match self {
            TimeFilter::Any => FilterLabel {
                selected_time: String::new(),
                any_time_visible: true,
            },
            TimeFilter::At(minute) => FilterLabel {
                selected_time: minute.to_short_time(),
                any_time_visible: false,
            },
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFilter::Any => f.write_str("any time"),
            TimeFilter::At(minute) => write!(f, "{}±{}min", minute, WINDOW_MINUTES),
        }
    }
}

/// What the filter label widget shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLabel {
    pub selected_time: String,
    pub any_time_visible: bool,
}
