//! Register definitions and bitfield structures for the Orion RTC.
//!
//! The peripheral keeps calendar time in two 32-bit words, TIME at offset
//! `0x0` and DATE at offset `0x4`. Every calendar field is a BCD byte packed
//! at a fixed bit offset. Only the bits listed below are part of the hardware
//! contract; everything else reads as don't-care and is written as zero.
//!
//! | Word | Field           | Bits    | Encoding        |
//! |------|-----------------|---------|-----------------|
//! | TIME | seconds         | [6:0]   | BCD             |
//! | TIME | minutes         | [14:8]  | BCD             |
//! | TIME | hours           | [21:16] | BCD (24h only)  |
//! | TIME | 12h-mode flag   | [22]    | boolean         |
//! | TIME | weekday         | [26:24] | binary 0-6      |
//! | DATE | day of month    | [5:0]   | BCD             |
//! | DATE | month           | [13:8]  | BCD, 1-based    |
//! | DATE | year in century | [23:16] | BCD             |

use bitfield::bitfield;

/// Register offsets of the Orion RTC, in bytes from the mapped base.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Time of day and weekday
    Time = 0x0,
    /// Day, month and year within the century
    Date = 0x4,
}

impl RegAddr {
    /// Byte offset of the register within the mapped region.
    pub const fn offset(self) -> usize {
        self as usize
    }
}

/// TIME word value the peripheral reports while its oscillator is stopped.
///
/// It is also a legal reading for one second at a real Sunday midnight, so it
/// must be seen twice before the clock is declared dead.
pub const NOT_TICKING_SENTINEL: u32 = 0x0100_0000;

/// First hardware year (20xx) that no longer fits a signed 32-bit seconds count.
pub const EPOCH_OVERFLOW_YEAR: u8 = 38;

/// DATE word written when the stored year overflows: 2013-01-01.
pub const EPOCH_RESET_DATE: u32 = 0x0013_0101;

/// Converts a binary value into a packed BCD byte.
///
/// Values above 99 are outside the contract and wrap silently.
pub const fn bin2bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Converts a packed BCD byte into its binary value.
pub const fn bcd2bin(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0f)
}

// This macro generates the From<u32> and Into<u32> implementations for the
// register type
macro_rules! from_register_u32 {
    ($typ:ident) => {
        impl From<u32> for $typ {
            fn from(v: u32) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u32 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// TIME word: seconds, minutes, hours and weekday.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct TimeReg(u32);
    impl Debug;
    /// Seconds (BCD, 0-59)
    pub u8, seconds, set_seconds: 6, 0;
    /// Minutes (BCD, 0-59)
    pub u8, minutes, set_minutes: 14, 8;
    /// Hours (BCD, 0-23)
    pub u8, hours, set_hours: 21, 16;
    /// 12-hour mode flag, never supported by this driver
    pub twelve_hour_mode, set_twelve_hour_mode: 22;
    /// Day of week (binary, 0-6)
    pub u8, weekday, set_weekday: 26, 24;
}
from_register_u32!(TimeReg);

impl TimeReg {
    /// True when the word equals the stopped-oscillator reading.
    pub fn is_not_ticking_sentinel(self) -> bool {
        self.0 == NOT_TICKING_SENTINEL
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimeReg {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "TimeReg({=u8:x}:{=u8:x}:{=u8:x} wday={=u8}",
            self.hours(),
            self.minutes(),
            self.seconds(),
            self.weekday()
        );
        if self.twelve_hour_mode() {
            defmt::write!(f, ", 12h");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// DATE word: day of month, month and year within the century.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct DateReg(u32);
    impl Debug;
    /// Day of month (BCD, 1-31)
    pub u8, day, set_day: 5, 0;
    /// Month (BCD, 1-12)
    pub u8, month, set_month: 13, 8;
    /// Year within the century (BCD, 0-99)
    pub u8, year, set_year: 23, 16;
}
from_register_u32!(DateReg);

impl DateReg {
    /// Binary year relative to 2000, decoded from the year field alone.
    pub fn binary_year(self) -> u8 {
        bcd2bin(self.year())
    }

    /// True when the stored year would overflow a signed 32-bit timestamp.
    pub fn overflows_epoch(self) -> bool {
        self.binary_year() >= EPOCH_OVERFLOW_YEAR
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DateReg {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "DateReg(year={=u8:x} month={=u8:x} day={=u8:x})",
            self.year(),
            self.month(),
            self.day()
        );
    }
}
