#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]
//!
//! ## Design Principles
//!
//! - **Async-first**: Built on `embedded-hal-async` I2C and delay traits
//! - **Frozen-gauge tolerant**: Every 16-bit read detects the `0x16CC` sentinel
//!   the BQ40Z80 returns while sealed and retries through ManufacturerBlockAccess
//! - **Stateless liveness**: The driver keeps no "is frozen" flag; each read
//!   rediscovers the device state on its own
//! - **Spaced commands**: A configurable delay follows every bus command
//!
//! ## Module Organization
//!
//! - [`config`]: Bus address and timing configuration
//! - [`sbs`]: Typed SBS readings, status decoding and the composite snapshot
//! - [`settings`]: Charge-control writes
//! - [`mac`]: ManufacturerAccess and ManufacturerBlockAccess sub-commands
//! - [`recovery`]: Initialization probe, unseal recovery and bus re-initialization
//! - [`report`]: Human-readable battery report
//!
//! ## Basic Usage
//!
//! ```no_run
//! # use embedded_hal_async::{delay::DelayNs, i2c::I2c};
//! # async fn example<I: I2c, D: DelayNs>(i2c: I, delay: D) -> Result<(), bq40z80::Error<I::Error>> {
//! use bq40z80::{Bq40z80, Reading};
//!
//! let mut gauge = Bq40z80::new(i2c, delay);
//!
//! // Best-effort probe; unseals a frozen gauge when needed
//! let health = gauge.init().await;
//!
//! let mv = gauge.read_u16(Reading::Voltage).await?;
//! let snapshot = gauge.read_snapshot().await?;
//! # let _ = (health, mv, snapshot);
//! # Ok(())
//! # }
//! ```

// Must come first so the other modules see the logging macros.
mod fmt;

pub mod config;
mod defs;
pub mod mac;
pub mod recovery;
pub mod report;
pub(crate) mod rw;
pub mod sbs;
pub mod settings;
#[cfg(test)]
mod testing;
mod types;

use embedded_hal_async::{delay::DelayNs, i2c::*};

pub use config::{BusAddress, Config};
pub use mac::MacCommand;
pub use recovery::{BusRecovery, Health};
pub use sbs::Reading;
pub use settings::Setting;
pub use types::*;

/// Driver error type.
///
/// This error type wraps the underlying I2C error and adds BQ40Z80-specific
/// error conditions.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I2C communication error (NAK, arbitration loss, bus fault)
  I2c(E),
  /// Bus transaction did not complete within `Config::bus_timeout_ms`
  Timeout,
  /// Malformed SMBus frame or ManufacturerBlockAccess response
  Protocol(ProtocolError),
  /// Oversized block write, or a reading requested as the wrong value type
  InvalidParameter,
}

impl<E> Error<E> {
  /// `true` for failures of the bus itself (transport error or timeout).
  pub fn is_communication(&self) -> bool {
    matches!(self, Error::I2c(_) | Error::Timeout)
  }

  /// Short label for log lines; the bus error itself is not required to be loggable.
  pub(crate) fn describe(&self) -> &'static str {
    match self {
      Error::I2c(_) => "bus error",
      Error::Timeout => "timeout",
      Error::Protocol(_) => "protocol error",
      Error::InvalidParameter => "invalid parameter",
    }
  }
}

/// Reasons a response from the gauge was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
  /// Block length byte above the 32-byte SMBus maximum
  BlockLength(u8),
  /// ManufacturerBlockAccess answer shorter than command echo + result word
  ShortResponse(usize),
  /// ManufacturerBlockAccess echoed a different command than was sent
  EchoMismatch { sent: u16, echoed: u16 },
  /// Name block is not valid UTF-8
  InvalidString,
  /// Packed register value could not be unpacked
  Decode,
}

/// BQ40Z80 device driver instance.
///
/// Holds the bus and delay provider plus the configuration fixed at
/// construction. Pass `&mut bus` as `I` to lend the bus to the driver instead
/// of moving it in.
///
/// The driver is not meant to be shared: every method takes `&mut self`, so
/// tasks that touch the same gauge must serialize access themselves.
///
/// # Type Parameters
///
/// - `I`: I2C implementation (must implement `embedded_hal_async::i2c::I2c`)
/// - `D`: Delay provider (must implement `embedded_hal_async::delay::DelayNs`)
pub struct Bq40z80<I, D: DelayNs> {
  i2c: I,
  delay: D,
  config: Config,
  bus: BusAddress,
}

impl<I, D, E> Bq40z80<I, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Create a driver for a gauge at the default address `0x0B`.
  pub fn new(i2c: I, delay: D) -> Self {
    Self::with_config(i2c, delay, Config::default())
  }

  /// Create a driver with an explicit configuration.
  ///
  /// # Arguments
  ///
  /// - `i2c`: I2C bus implementation
  /// - `delay`: Delay provider for command spacing and device timing
  /// - `config`: Address and timing, read-only afterwards
  pub fn with_config(i2c: I, delay: D, config: Config) -> Self {
    let bus = BusAddress::from(&config);
    Self { i2c, delay, config, bus }
  }

  /// Consume the driver and return the bus and delay provider.
  pub fn release(self) -> (I, D) {
    (self.i2c, self.delay)
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// 8-bit write/read addresses derived from the configured 7-bit address.
  pub fn bus_address(&self) -> BusAddress {
    self.bus
  }
}
