//! Async probe for the Orion RTC.
//!
//! Register access is plain memory-mapped I/O and never waits, so the only
//! step that benefits from `async` is the pause before re-reading a TIME word
//! that matched the stopped-oscillator sentinel. This module provides that
//! step on top of `embedded-hal-async`'s `DelayNs`. It is only available when
//! the `async` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use orion_rtc::OrionRtcDriver;
//!
//! let driver = OrionRtcDriver::default();
//! driver.probe_async(&mut platform, &mut delay, &mut registry).await?;
//! ```

use embedded_hal_async::delay::DelayNs;

use crate::driver::request_regs;
use crate::guard::{check_mode, confirm_ticking, read_time_reg, repair_epoch_overflow};
use crate::{
    Config, GuardReport, OrionRtc, OrionRtcDriver, OrionRtcError, Platform, RegisterAccess,
    RtcRegistry,
};

/// Runs the power-on checks, awaiting the settle delay.
///
/// Same checks and outcomes as [`crate::guard::check`].
pub async fn check<R: RegisterAccess, D: DelayNs>(
    regs: &mut R,
    delay: &mut D,
    config: &Config,
) -> Result<GuardReport, OrionRtcError> {
    let time = read_time_reg(regs);
    debug!("power-on TIME={:#x}", time.0);
    check_mode(time)?;

    if time.is_not_ticking_sentinel() {
        delay.delay_ms(config.settle_delay_ms).await;
        confirm_ticking(read_time_reg(regs))?;
    }

    Ok(repair_epoch_overflow(regs))
}

impl<R: RegisterAccess> OrionRtc<R> {
    /// Runs the power-on guard asynchronously and wraps the register block.
    ///
    /// # Errors
    /// * `Err(OrionRtcError::UnsupportedMode)` if 12-hour mode is enabled
    /// * `Err(OrionRtcError::NotTicking)` if the clock is stopped
    pub async fn init_async<D: DelayNs>(
        mut regs: R,
        delay: &mut D,
        config: &Config,
    ) -> Result<Self, OrionRtcError> {
        check(&mut regs, delay, config).await?;
        Ok(Self::new(regs, crate::is_valid_tm))
    }
}

impl OrionRtcDriver {
    /// Probes one device, awaiting the liveness delay.
    ///
    /// Same steps and errors as [`OrionRtcDriver::probe`].
    pub async fn probe_async<P, D, G>(
        &self,
        platform: &mut P,
        delay: &mut D,
        registry: &mut G,
    ) -> Result<(), OrionRtcError>
    where
        P: Platform,
        D: DelayNs,
        G: RtcRegistry<OrionRtc<P::Regs>>,
    {
        let mut regs = request_regs(platform)?;
        check(&mut regs, delay, self.config()).await?;
        self.register(regs, registry)
    }
}
