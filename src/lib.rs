//! A platform-agnostic driver for the real-time clock in Marvell Orion SoCs.
//!
//! The RTC keeps calendar time in two memory-mapped 32-bit words (TIME and
//! DATE) with every field stored as BCD. This crate packs and unpacks those
//! words, performs the power-on sanity checks the peripheral needs, and
//! exposes `read_time` / `set_time` to a generic time subsystem.
//!
//! # Features
//!
//! - Register codec between [`CalendarTime`] and the TIME/DATE words
//! - Power-on guard: rejects 12-hour mode, detects a stopped oscillator and
//!   resets dates that would overflow a 32-bit timestamp
//! - Conversion to and from chrono's `NaiveDateTime`
//! - Probe entry point with explicit platform and registry collaborators
//! - Optional async probe (`async` feature)
//! - Optional logging through `log` or `defmt`
//!
//! # Example
//!
//! ```rust,ignore
//! use orion_rtc::{Config, Mmio, OrionRtc, RtcOps};
//!
//! // Safety: 0xf101_0300 is the RTC block on Kirkwood and stays mapped
//! let regs = unsafe { Mmio::new(0xf101_0300 as *mut u32) }.unwrap();
//! let mut rtc = OrionRtc::init(regs, &mut delay, &Config::default())?;
//!
//! let now = rtc.read_time()?;
//! rtc.set_datetime(&some_naive_datetime)?;
//! ```
//!
//! # Register access
//!
//! All hardware access goes through [`RegisterAccess`]. [`Mmio`] is the
//! volatile implementation for real hardware; tests use in-memory fakes.
//!
//! The TIME and DATE words are read as two independent bus transactions. A
//! rollover between the two reads yields a torn snapshot (new time, old date
//! or the other way round). The peripheral offers no way to latch both words,
//! so callers that need a consistent value must read twice and compare.
#![no_std]

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        log::debug!($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        log::info!($($arg)*);
    }};
}

macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::error!($($arg)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        log::error!($($arg)*);
    }};
}

#[cfg(feature = "async")]
pub mod asynch;
pub mod datetime;
pub mod driver;
pub mod guard;
#[cfg(test)]
mod mock;
pub mod registers;

use core::fmt;
use core::ptr::{self, NonNull};

use chrono::NaiveDateTime;
use embedded_hal::delay::DelayNs;
use paste::paste;

pub use datetime::{is_valid_tm, CalendarTime, RegisterPair, Validator};
pub use driver::{of_match, OrionRtcDriver, Platform, RtcRegistry, DRIVER_NAME, OF_COMPATIBLE};
pub use guard::GuardReport;
pub use registers::*;

/// Configuration for the Orion RTC driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// How long to wait before re-reading a TIME word that matched the
    /// stopped-oscillator sentinel. The counter advances once per second, so
    /// anything above one second tells a real midnight from a dead clock.
    pub settle_delay_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1100,
        }
    }
}

/// Error returned by a time subsystem that refused a registration.
///
/// Carries the subsystem's own error code unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationError(pub i32);

/// Errors reported by the Orion RTC driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OrionRtcError {
    /// The 12-hour mode flag is set; only 24-hour mode is supported
    UnsupportedMode,
    /// The TIME word read as the stopped-oscillator sentinel twice
    NotTicking,
    /// The decoded time failed the plausibility check
    ImplausibleDate,
    /// The platform could not provide the register region
    RegionUnavailable,
    /// The time subsystem refused the device
    Registration(RegistrationError),
}

impl From<RegistrationError> for OrionRtcError {
    fn from(e: RegistrationError) -> Self {
        OrionRtcError::Registration(e)
    }
}

impl fmt::Display for OrionRtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrionRtcError::UnsupportedMode => {
                f.write_str("12 hour mode is enabled but not supported")
            }
            OrionRtcError::NotTicking => f.write_str("internal RTC not ticking"),
            OrionRtcError::ImplausibleDate => f.write_str("RTC holds an invalid date"),
            OrionRtcError::RegionUnavailable => f.write_str("could not get memory region"),
            OrionRtcError::Registration(e) => {
                write!(f, "failed to register rtc device: {}", e.0)
            }
        }
    }
}

impl core::error::Error for OrionRtcError {}

/// Word-wide access to the RTC register block.
///
/// `offset` is a byte offset from the start of the block (see [`RegAddr`]).
/// Accesses are assumed to complete in bounded time and cannot fail.
pub trait RegisterAccess {
    /// Reads the 32-bit word at `offset`.
    fn read32(&mut self, offset: usize) -> u32;
    /// Writes the 32-bit word at `offset`.
    fn write32(&mut self, offset: usize, value: u32);
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read32(&mut self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        (**self).write32(offset, value);
    }
}

/// Volatile access to a memory-mapped RTC register block.
#[derive(Debug)]
pub struct Mmio {
    base: NonNull<u32>,
}

impl Mmio {
    /// Wraps the base address of the register block.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    /// `base` must point to the RTC register block, be 4-byte aligned and stay
    /// valid for volatile 32-bit reads and writes at offsets `0x0` and `0x4`
    /// for as long as the returned value is alive. No other code may access
    /// the block concurrently.
    pub unsafe fn new(base: *mut u32) -> Option<Self> {
        NonNull::new(base).map(|base| Self { base })
    }

    fn word(&self, offset: usize) -> *mut u32 {
        self.base
            .as_ptr()
            .cast::<u8>()
            .wrapping_add(offset)
            .cast::<u32>()
    }
}

impl RegisterAccess for Mmio {
    fn read32(&mut self, offset: usize) -> u32 {
        // Safety: guaranteed by the contract of `Mmio::new`
        unsafe { ptr::read_volatile(self.word(offset)) }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        // Safety: guaranteed by the contract of `Mmio::new`
        unsafe { ptr::write_volatile(self.word(offset), value) }
    }
}

/// Operations a time subsystem calls on a registered clock.
pub trait RtcOps {
    /// Returns the current time.
    fn read_time(&mut self) -> Result<CalendarTime, OrionRtcError>;
    /// Sets the current time.
    fn set_time(&mut self, tm: &CalendarTime) -> Result<(), OrionRtcError>;
}

/// Orion RTC driver.
///
/// Created once the power-on guard has passed, either through
/// [`OrionRtc::init`] or by [`OrionRtcDriver::probe`].
pub struct OrionRtc<R: RegisterAccess> {
    regs: R,
    validator: Validator,
}

impl<R: RegisterAccess> OrionRtc<R> {
    /// Wraps a register block without running the power-on guard.
    ///
    /// # Arguments
    /// * `regs` - Access to the RTC register block
    /// * `validator` - Plausibility check applied by [`RtcOps::read_time`]
    pub fn new(regs: R, validator: Validator) -> Self {
        Self { regs, validator }
    }

    /// Runs the power-on guard and wraps the register block.
    ///
    /// Uses [`is_valid_tm`] as the plausibility check.
    ///
    /// # Errors
    /// * `Err(OrionRtcError::UnsupportedMode)` if 12-hour mode is enabled
    /// * `Err(OrionRtcError::NotTicking)` if the clock is stopped
    pub fn init<D: DelayNs>(
        mut regs: R,
        delay: &mut D,
        config: &Config,
    ) -> Result<Self, OrionRtcError> {
        guard::check(&mut regs, delay, config)?;
        Ok(Self::new(regs, is_valid_tm))
    }

    /// Releases the register block.
    pub fn release(self) -> R {
        self.regs
    }

    /// Reads both words. TIME is read before DATE.
    pub fn read_raw(&mut self) -> RegisterPair {
        let time = self.time_reg();
        let date = self.date_reg();
        RegisterPair { time, date }
    }

    /// Writes both words. TIME is written before DATE; there is no rollback
    /// if the second write never happens.
    pub fn write_raw(&mut self, raw: &RegisterPair) {
        self.set_time_reg(raw.time);
        self.set_date_reg(raw.date);
    }

    /// Gets the current date and time as a chrono `NaiveDateTime`.
    ///
    /// # Errors
    /// * `Err(OrionRtcError::ImplausibleDate)` if the registers hold an
    ///   invalid date
    pub fn datetime(&mut self) -> Result<NaiveDateTime, OrionRtcError> {
        let tm = self.read_time()?;
        NaiveDateTime::try_from(&tm)
    }

    /// Sets the current date and time from a chrono `NaiveDateTime`.
    ///
    /// Only the year within the century is stored, so years outside
    /// 2000-2099 read back shifted into that range.
    ///
    /// # Errors
    /// * `Err(OrionRtcError::ImplausibleDate)` for years before 1900 or after
    ///   1900 + `u16::MAX`
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), OrionRtcError> {
        let tm = CalendarTime::try_from(datetime)?;
        self.set_time(&tm)
    }
}

impl<R: RegisterAccess> RtcOps for OrionRtc<R> {
    fn read_time(&mut self) -> Result<CalendarTime, OrionRtcError> {
        let raw = self.read_raw();
        raw.decode(self.validator)
    }

    fn set_time(&mut self, tm: &CalendarTime) -> Result<(), OrionRtcError> {
        let raw = RegisterPair::encode(tm);
        self.write_raw(&raw);
        Ok(())
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ident)),+) => {
        impl<R: RegisterAccess> OrionRtc<R> {
            $(
                paste! {
                    #[doc = concat!("Reads the raw ", stringify!($typ), " word.")]
                    pub fn $name(&mut self) -> $typ {
                        let value = self.regs.read32($regaddr.offset());
                        debug!("read {:#x} from offset {:#x}", value, $regaddr.offset());
                        $typ(value)
                    }

                    #[doc = concat!("Writes the raw ", stringify!($typ), " word.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) {
                        debug!("write {:#x} to offset {:#x}", value.0, $regaddr.offset());
                        self.regs.write32($regaddr.offset(), value.into());
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (time_reg, RegAddr::Time, TimeReg),
    (date_reg, RegAddr::Date, DateReg)
);
