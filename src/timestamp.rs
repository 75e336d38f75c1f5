//! MS-DOS timestamp handling.
//!
//! ZIP records store the last-modified time of an entry as two packed
//! 16-bit words:
//!
//! | Word | Bits 15-9 | Bits 8-5 | Bits 4-0 |
//! |------|-----------|----------|----------|
//! | date | year - 1980 | month (1-12) | day (1-31) |
//!
//! | Word | Bits 15-11 | Bits 10-5 | Bits 4-0 |
//! |------|------------|-----------|----------|
//! | time | hour | minute | second / 2 |
//!
//! # Precision
//!
//! DOS timestamps have a two-second resolution and cover 1980-01-01 through
//! 2107-12-31. Times outside that range are clamped to the nearest bound.
//! Conversions from [`SystemTime`] are performed in UTC.
//!
//! # Example
//!
//! ```rust
//! use zipflow::DosDateTime;
//!
//! let ts = DosDateTime::new(2020, 6, 15, 12, 34, 56).unwrap();
//! assert_eq!(ts.year(), 2020);
//! assert_eq!(ts.second(), 56);
//!
//! // Seconds are stored halved, odd values round down.
//! let ts = DosDateTime::new(2020, 6, 15, 12, 34, 57).unwrap();
//! assert_eq!(ts.second(), 56);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix time of 1980-01-01 00:00:00 UTC.
const DOS_EPOCH_UNIX_SECS: i64 = 315_532_800;

const SECONDS_PER_DAY: i64 = 86_400;

const MIN_YEAR: u16 = 1980;
const MAX_YEAR: u16 = 2107;

/// A packed MS-DOS date/time pair as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DosDateTime {
    date: u16,
    time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const MIN: Self = Self {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// 2107-12-31 23:59:58, the latest representable instant.
    pub const MAX: Self = Self {
        date: (127 << 9) | (12 << 5) | 31,
        time: (23 << 11) | (59 << 5) | 29,
    };

    /// Creates a timestamp from calendar components.
    ///
    /// Returns `None` if any component is out of range. Odd seconds are
    /// rounded down to the two-second resolution of the format.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year)
            || !(1..=12).contains(&month)
            || !(1..=days_in_month(year, month)).contains(&day)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }

        Some(Self {
            date: ((year - MIN_YEAR) << 9) | ((month as u16) << 5) | day as u16,
            time: ((hour as u16) << 11) | ((minute as u16) << 5) | (second as u16 / 2),
        })
    }

    /// Creates a timestamp from the raw packed words.
    #[inline]
    pub const fn from_raw(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    /// Creates a timestamp from Unix seconds (UTC), clamping to the DOS range.
    pub fn from_unix_secs(secs: i64) -> Self {
        if secs < DOS_EPOCH_UNIX_SECS {
            return Self::MIN;
        }

        let days = secs.div_euclid(SECONDS_PER_DAY);
        let secs_of_day = secs.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        if year > MAX_YEAR as i64 {
            return Self::MAX;
        }

        let hour = (secs_of_day / 3600) as u8;
        let minute = ((secs_of_day % 3600) / 60) as u8;
        let second = (secs_of_day % 60) as u8;

        Self::new(year as u16, month, day, hour, minute, second).unwrap_or(Self::MIN)
    }

    /// Creates a timestamp from a `SystemTime`, clamping to the DOS range.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(duration) => {
                Self::from_unix_secs(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
            }
            Err(_) => Self::MIN,
        }
    }

    /// Returns the current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Returns the packed date word.
    #[inline]
    pub const fn date(&self) -> u16 {
        self.date
    }

    /// Returns the packed time word.
    #[inline]
    pub const fn time(&self) -> u16 {
        self.time
    }

    /// Returns the year (1980-2107).
    pub fn year(&self) -> u16 {
        (self.date >> 9) + MIN_YEAR
    }

    /// Returns the month (1-12).
    pub fn month(&self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    /// Returns the day of the month (1-31).
    pub fn day(&self) -> u8 {
        (self.date & 0x1F) as u8
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u8 {
        (self.time >> 11) as u8
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    /// Returns the second (0-58, always even).
    pub fn second(&self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<SystemTime> for DosDateTime {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl std::fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Converts days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
