//! Driver configuration.
//!
//! A [`Config`] is handed to [`Bq40z80::with_config`](crate::Bq40z80::with_config)
//! once and is read-only for the lifetime of the driver.
//!
//! ```
//! use bq40z80::Config;
//!
//! let cfg = Config { command_delay_ms: 5, ..Default::default() };
//! assert_eq!(cfg.address, 0x0B);
//! ```

use crate::defs::ADDR_DEFAULT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  /// 7-bit SMBus address of the gauge. Default `0x0B`.
  pub address: u8,
  /// Spacing inserted after every bus command. The BQ40Z80 corrupts commands
  /// issued back-to-back, so keep this at 1 ms or more. Default 1 ms.
  pub command_delay_ms: u32,
  /// Upper bound for a single bus transaction; `0` waits forever.
  /// Default 25 ms (SMBus `t_TIMEOUT`).
  pub bus_timeout_ms: u32,
}

impl Default for Config {
  fn default() -> Self {
    Config { address: ADDR_DEFAULT, command_delay_ms: 1, bus_timeout_ms: 25 }
  }
}

/// 8-bit SMBus addresses derived from [`Config::address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusAddress {
  pub write: u8,
  pub read: u8,
}

impl From<&Config> for BusAddress {
  fn from(cfg: &Config) -> Self {
    let shifted = (cfg.address & 0x7F) << 1;
    BusAddress { write: shifted, read: shifted | 0x01 }
  }
}
