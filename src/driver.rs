//! Driver binding for the Orion RTC.
//!
//! The host environment owns device discovery, resource mapping and the time
//! subsystem. This module describes the driver to that environment and
//! provides the probe step:
//!
//! 1. request memory region 0 from the [`Platform`],
//! 2. run the power-on guard,
//! 3. hand the ready [`OrionRtc`] to the [`RtcRegistry`].
//!
//! Any failure aborts the probe and nothing is registered.

use embedded_hal::delay::DelayNs;

use crate::{
    guard, is_valid_tm, Config, OrionRtc, OrionRtcError, RegisterAccess, RegistrationError,
    RtcOps, Validator,
};

/// Driver name.
pub const DRIVER_NAME: &str = "rtc-mv";

/// Device tree compatible strings this driver binds to.
pub const OF_COMPATIBLE: &[&str] = &["marvell,orion-rtc"];

/// Returns true if a device with the given compatible string belongs to this
/// driver.
pub fn of_match(compatible: &str) -> bool {
    OF_COMPATIBLE.contains(&compatible)
}

/// Resource provider for a device being probed.
pub trait Platform {
    /// Register access handle for a mapped region.
    type Regs: RegisterAccess;

    /// Maps memory region `index` of the device.
    ///
    /// Returns `None` if the region is missing or cannot be mapped.
    fn request_mem_region(&mut self, index: usize) -> Option<Self::Regs>;
}

/// The time subsystem's registration entry point.
pub trait RtcRegistry<T: RtcOps> {
    /// Publishes a ready clock. On error the clock is dropped.
    fn register(&mut self, rtc: T) -> Result<(), RegistrationError>;
}

/// Orion RTC driver description and probe entry point.
#[derive(Copy, Clone)]
pub struct OrionRtcDriver {
    config: Config,
    validator: Validator,
}

impl Default for OrionRtcDriver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl OrionRtcDriver {
    /// Creates a driver using [`is_valid_tm`] as the plausibility check.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            validator: is_valid_tm,
        }
    }

    /// Replaces the plausibility check applied by `read_time`.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Driver configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Probes one device.
    ///
    /// # Arguments
    /// * `platform` - Provides the device's register region
    /// * `delay` - Used by the liveness check
    /// * `registry` - Receives the clock once it is ready
    ///
    /// # Returns
    /// * `Ok(())` once the clock is registered
    /// * `Err(OrionRtcError::RegionUnavailable)` if region 0 cannot be mapped
    /// * `Err(OrionRtcError::UnsupportedMode)` if 12-hour mode is enabled
    /// * `Err(OrionRtcError::NotTicking)` if the clock is stopped
    /// * `Err(OrionRtcError::Registration)` if the registry refused the clock
    pub fn probe<P, D, G>(
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
        guard::check(&mut regs, delay, &self.config)?;
        self.register(regs, registry)
    }

    pub(crate) fn register<R, G>(&self, regs: R, registry: &mut G) -> Result<(), OrionRtcError>
    where
        R: RegisterAccess,
        G: RtcRegistry<OrionRtc<R>>,
    {
        registry
            .register(OrionRtc::new(regs, self.validator))
            .map_err(|e| {
                error!("Failed to register rtc device: {}", e.0);
                OrionRtcError::from(e)
            })
    }
}

pub(crate) fn request_regs<P: Platform>(platform: &mut P) -> Result<P::Regs, OrionRtcError> {
    platform.request_mem_region(0).ok_or_else(|| {
        error!("could not get memory region");
        OrionRtcError::RegionUnavailable
    })
}
