//! Power-on checks for the Orion RTC.
//!
//! The guard runs once, before the clock is handed to the time subsystem,
//! directly against the live TIME and DATE words:
//!
//! 1. A set 12-hour flag fails with [`OrionRtcError::UnsupportedMode`].
//! 2. A TIME word equal to [`crate::NOT_TICKING_SENTINEL`] is re-read after
//!    [`Config::settle_delay_ms`]; a second match fails with
//!    [`OrionRtcError::NotTicking`].
//! 3. A DATE year of 2038 or later is overwritten with
//!    [`EPOCH_RESET_DATE`] (2013-01-01). This repairs the clock and is not an
//!    error.
//!
//! The async variant lives in [`crate::asynch`] and shares the steps below.

use embedded_hal::delay::DelayNs;

use crate::{Config, DateReg, OrionRtcError, RegAddr, RegisterAccess, TimeReg, EPOCH_RESET_DATE};

/// What the guard changed on its way to `ready`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GuardReport {
    /// The DATE word overflowed the epoch and was reset to 2013-01-01
    pub date_reset: bool,
}

pub(crate) fn read_time_reg<R: RegisterAccess>(regs: &mut R) -> TimeReg {
    TimeReg(regs.read32(RegAddr::Time.offset()))
}

/// Fails if the peripheral runs in 12-hour mode.
pub(crate) fn check_mode(time: TimeReg) -> Result<(), OrionRtcError> {
    if time.twelve_hour_mode() {
        error!("12 Hour mode is enabled but not supported.");
        return Err(OrionRtcError::UnsupportedMode);
    }
    Ok(())
}

/// Fails if a second TIME reading still shows the sentinel.
pub(crate) fn confirm_ticking(second_read: TimeReg) -> Result<(), OrionRtcError> {
    if second_read.is_not_ticking_sentinel() {
        error!("internal RTC not ticking");
        return Err(OrionRtcError::NotTicking);
    }
    Ok(())
}

/// Resets the DATE word if its year would overflow a 32-bit timestamp.
pub(crate) fn repair_epoch_overflow<R: RegisterAccess>(regs: &mut R) -> GuardReport {
    let date = DateReg(regs.read32(RegAddr::Date.offset()));
    if !date.overflows_epoch() {
        return GuardReport::default();
    }
    info!(
        "invalid RTC date (year {} after 2000), resetting to January 1st, 2013",
        date.binary_year()
    );
    regs.write32(RegAddr::Date.offset(), EPOCH_RESET_DATE);
    GuardReport { date_reset: true }
}

/// Runs the power-on checks.
///
/// # Arguments
/// * `regs` - Access to the RTC register block
/// * `delay` - Used to wait before re-reading a sentinel TIME word
/// * `config` - Driver configuration
///
/// # Returns
/// * `Ok(GuardReport)` when the clock is usable
/// * `Err(OrionRtcError::UnsupportedMode)` if 12-hour mode is enabled
/// * `Err(OrionRtcError::NotTicking)` if the clock is stopped
pub fn check<R: RegisterAccess, D: DelayNs>(
    regs: &mut R,
    delay: &mut D,
    config: &Config,
) -> Result<GuardReport, OrionRtcError> {
    let time = read_time_reg(regs);
    debug!("power-on TIME={:#x}", time.0);
    check_mode(time)?;

    if time.is_not_ticking_sentinel() {
        debug!("TIME holds {:#x}, checking again", time.0);
        delay.delay_ms(config.settle_delay_ms);
        confirm_ticking(read_time_reg(regs))?;
    }

    Ok(repair_epoch_overflow(regs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NOT_TICKING_SENTINEL;
    use crate::mock::{MemoryRegisters, RecordingDelay, RegisterMock, Transaction};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn test_healthy_clock_passes() {
        let mut mock = RegisterMock::new(&[
            Transaction::read(RegAddr::Time, 0x0312_4530),
            Transaction::read(RegAddr::Date, 0x0023_0615),
        ]);
        let mut delay = RecordingDelay::default();

        let report = check(&mut mock, &mut delay, &Config::default()).unwrap();
        assert_eq!(report, GuardReport { date_reset: false });
        assert_eq!(delay.calls, 0);
        mock.done();
    }

    #[test]
    fn test_twelve_hour_mode_rejected() {
        // Only the mode flag set
        let mut mock = RegisterMock::new(&[Transaction::read(RegAddr::Time, 0x0040_0000)]);
        let result = check(&mut mock, &mut NoopDelay::new(), &Config::default());
        assert_eq!(result, Err(OrionRtcError::UnsupportedMode));
        mock.done();

        // Mode flag together with an otherwise valid time
        let mut mock = RegisterMock::new(&[Transaction::read(RegAddr::Time, 0x0352_4530)]);
        let result = check(&mut mock, &mut NoopDelay::new(), &Config::default());
        assert_eq!(result, Err(OrionRtcError::UnsupportedMode));
        mock.done();

        // Mode flag on top of the sentinel still reports the mode
        let mut mock = RegisterMock::new(&[Transaction::read(
            RegAddr::Time,
            NOT_TICKING_SENTINEL | 0x0040_0000,
        )]);
        let result = check(&mut mock, &mut NoopDelay::new(), &Config::default());
        assert_eq!(result, Err(OrionRtcError::UnsupportedMode));
        mock.done();
    }

    #[test]
    fn test_mode_rejected_before_date_is_touched() {
        let mut regs = MemoryRegisters::new(0x0040_0000, 0x0099_0101);
        let result = check(&mut regs, &mut NoopDelay::new(), &Config::default());
        assert_eq!(result, Err(OrionRtcError::UnsupportedMode));
        assert_eq!(regs.word(RegAddr::Date), 0x0099_0101);
    }

    #[test]
    fn test_sentinel_twice_is_not_ticking() {
        let mut mock = RegisterMock::new(&[
            Transaction::read(RegAddr::Time, NOT_TICKING_SENTINEL),
            Transaction::read(RegAddr::Time, NOT_TICKING_SENTINEL),
        ]);
        let mut delay = RecordingDelay::default();

        let result = check(&mut mock, &mut delay, &Config::default());
        assert_eq!(result, Err(OrionRtcError::NotTicking));
        assert_eq!(delay.total_ns, 1_100_000_000);
        mock.done();
    }

    #[test]
    fn test_sentinel_once_is_a_real_midnight() {
        let mut mock = RegisterMock::new(&[
            Transaction::read(RegAddr::Time, NOT_TICKING_SENTINEL),
            Transaction::read(RegAddr::Time, NOT_TICKING_SENTINEL + 1),
            Transaction::read(RegAddr::Date, 0x0023_0618),
        ]);
        let mut delay = RecordingDelay::default();

        let report = check(&mut mock, &mut delay, &Config::default()).unwrap();
        assert!(!report.date_reset);
        assert_eq!(delay.calls, 1);
        mock.done();
    }

    #[test]
    fn test_settle_delay_is_configurable() {
        let mut mock = RegisterMock::new(&[
            Transaction::read(RegAddr::Time, NOT_TICKING_SENTINEL),
            Transaction::read(RegAddr::Time, 0x0100_0001),
            Transaction::read(RegAddr::Date, 0x0023_0618),
        ]);
        let mut delay = RecordingDelay::default();
        let config = Config {
            settle_delay_ms: 5,
        };

        check(&mut mock, &mut delay, &config).unwrap();
        assert_eq!(delay.total_ns, 5_000_000);
        mock.done();
    }

    #[test]
    fn test_epoch_overflow_is_repaired() {
        let mut mock = RegisterMock::new(&[
            Transaction::read(RegAddr::Time, 0x0312_4530),
            Transaction::read(RegAddr::Date, 0x0038_0119),
            Transaction::write(RegAddr::Date, 0x0013_0101),
        ]);

        let report = check(&mut mock, &mut NoopDelay::new(), &Config::default()).unwrap();
        assert_eq!(report, GuardReport { date_reset: true });
        mock.done();
    }

    #[test]
    fn test_epoch_overflow_boundary() {
        // 2037 is left alone
        let mut regs = MemoryRegisters::new(0x0312_4530, 0x0037_1231);
        let report = check(&mut regs, &mut NoopDelay::new(), &Config::default()).unwrap();
        assert!(!report.date_reset);
        assert_eq!(regs.word(RegAddr::Date), 0x0037_1231);

        // 2099 is reset, the TIME word is untouched
        let mut regs = MemoryRegisters::new(0x0312_4530, 0x0099_1231);
        let report = check(&mut regs, &mut NoopDelay::new(), &Config::default()).unwrap();
        assert!(report.date_reset);
        assert_eq!(regs.word(RegAddr::Date), EPOCH_RESET_DATE);
        assert_eq!(regs.word(RegAddr::Time), 0x0312_4530);
    }

    #[test]
    fn test_epoch_check_ignores_bits_outside_year() {
        // Garbage above the year field does not count towards the year
        let mut regs = MemoryRegisters::new(0x0312_4530, 0xff23_0615);
        let report = check(&mut regs, &mut NoopDelay::new(), &Config::default()).unwrap();
        assert!(!report.date_reset);
    }

    #[test]
    fn test_stopped_clock_with_overflowed_date_is_not_repaired() {
        let mut regs = MemoryRegisters::new(NOT_TICKING_SENTINEL, 0x0050_0101);
        let result = check(&mut regs, &mut NoopDelay::new(), &Config::default());
        assert_eq!(result, Err(OrionRtcError::NotTicking));
        assert_eq!(regs.word(RegAddr::Date), 0x0050_0101);
    }
}
