//! Calendar time and the register codec for the Orion RTC.
//!
//! [`CalendarTime`] is the broken-down time the generic time subsystem works
//! with: years counted from 1900 and zero-based months. [`RegisterPair`] is
//! the TIME/DATE word pair as the peripheral stores it, with every field in
//! BCD, a one-based month and a year counted from 2000.
//!
//! # Codec
//!
//! - [`RegisterPair::encode`] packs a `CalendarTime` into the two words. It
//!   does no range checking; out-of-range fields wrap the same way the
//!   peripheral would accept them.
//! - [`RegisterPair::decode`] masks every field to its hardware width,
//!   converts BCD back to binary, rebases month and year and hands the result
//!   to a plausibility check supplied by the caller.
//!
//! Conversion to and from chrono's `NaiveDateTime` is provided for callers
//! that don't speak `struct tm`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::{bcd2bin, bin2bcd, DateReg, OrionRtcError, TimeReg};

/// Years between the time subsystem's 1900 baseline and the hardware's 2000 epoch.
const HW_EPOCH_OFFSET: u16 = 100;

/// Plausibility check applied to every decoded time.
///
/// The time subsystem owns this policy; [`is_valid_tm`] is the default.
pub type Validator = fn(&CalendarTime) -> bool;

/// Broken-down calendar time at one second resolution.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    /// Seconds (0-59)
    pub second: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Hours (0-23)
    pub hour: u8,
    /// Day of week (0-6, Sunday = 0)
    pub weekday: u8,
    /// Day of month (1-31)
    pub mday: u8,
    /// Month (0-11)
    pub month: u8,
    /// Years since 1900
    pub year: u16,
}

/// Default plausibility check for decoded times.
///
/// Rejects years before 1970, months outside 0-11, days that do not exist in
/// the given month (leap years included) and out-of-range time of day. The
/// weekday is not checked.
pub fn is_valid_tm(tm: &CalendarTime) -> bool {
    if tm.year < 70 || tm.month > 11 || tm.hour > 23 || tm.minute > 59 || tm.second > 59 {
        return false;
    }
    NaiveDate::from_ymd_opt(
        1900 + i32::from(tm.year),
        u32::from(tm.month) + 1,
        u32::from(tm.mday),
    )
    .is_some()
}

/// The TIME and DATE words as stored by the peripheral.
///
/// This is a snapshot taken with two separate bus reads. A rollover between
/// the reads produces a torn pair; callers that need a consistent value must
/// read twice and compare.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterPair {
    /// TIME word (offset 0x0)
    pub time: TimeReg,
    /// DATE word (offset 0x4)
    pub date: DateReg,
}

impl RegisterPair {
    /// Packs a calendar time into the TIME and DATE words.
    pub fn encode(tm: &CalendarTime) -> Self {
        let mut time = TimeReg::default();
        time.set_seconds(bin2bcd(tm.second));
        time.set_minutes(bin2bcd(tm.minute));
        time.set_hours(bin2bcd(tm.hour));
        time.set_weekday(bin2bcd(tm.weekday));

        let mut date = DateReg::default();
        date.set_day(bin2bcd(tm.mday));
        date.set_month(bin2bcd(tm.month.wrapping_add(1)));
        // century-relative; truncation to u8 is exact after the modulo
        date.set_year(bin2bcd((tm.year % 100) as u8));

        let raw = RegisterPair { time, date };
        debug!("encoded raw={:?}", raw);
        raw
    }

    /// Unpacks the words without any plausibility check.
    fn unpack(self) -> CalendarTime {
        CalendarTime {
            second: bcd2bin(self.time.seconds()),
            minute: bcd2bin(self.time.minutes()),
            hour: bcd2bin(self.time.hours()),
            weekday: bcd2bin(self.time.weekday()),
            mday: bcd2bin(self.date.day()),
            month: bcd2bin(self.date.month()).wrapping_sub(1),
            year: u16::from(self.date.binary_year()) + HW_EPOCH_OFFSET,
        }
    }

    /// Unpacks the words and checks the result with `is_valid`.
    ///
    /// # Errors
    /// Returns [`OrionRtcError::ImplausibleDate`] if `is_valid` rejects the
    /// decoded time.
    pub fn decode(self, is_valid: Validator) -> Result<CalendarTime, OrionRtcError> {
        let tm = self.unpack();
        debug!("decoded raw={:?} tm={:?}", self, tm);
        if is_valid(&tm) {
            Ok(tm)
        } else {
            Err(OrionRtcError::ImplausibleDate)
        }
    }
}

impl TryFrom<&NaiveDateTime> for CalendarTime {
    type Error = OrionRtcError;

    fn try_from(datetime: &NaiveDateTime) -> Result<Self, Self::Error> {
        let year = datetime
            .year()
            .checked_sub(1900)
            .and_then(|year| u16::try_from(year).ok())
            .ok_or(OrionRtcError::ImplausibleDate)?;
        let field = |v: u32| u8::try_from(v).map_err(|_| OrionRtcError::ImplausibleDate);
        Ok(CalendarTime {
            second: field(datetime.second())?,
            minute: field(datetime.minute())?,
            hour: field(datetime.hour())?,
            weekday: field(datetime.weekday().num_days_from_sunday())?,
            mday: field(datetime.day())?,
            month: field(datetime.month0())?,
            year,
        })
    }
}

impl TryFrom<&CalendarTime> for NaiveDateTime {
    type Error = OrionRtcError;

    fn try_from(tm: &CalendarTime) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(
            1900 + i32::from(tm.year),
            u32::from(tm.month) + 1,
            u32::from(tm.mday),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(tm.hour),
                u32::from(tm.minute),
                u32::from(tm.second),
            )
        })
        .ok_or(OrionRtcError::ImplausibleDate)
    }
}
