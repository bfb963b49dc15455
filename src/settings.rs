//! Charge-control writes.
//!
//! Settings are written as plain SMBus words: no fallback, no read-back and no
//! range checks. Keeping values inside the pack's safe limits is up to the
//! caller.

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::*, types::*, Bq40z80, Error, ProtocolError};

/// Writable SBS settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setting {
  /// Bitfield, see [`BatteryMode`]
  BatteryMode,
  /// Maximum charging current, mA
  ChargingCurrent,
  /// Maximum charging voltage, mV
  ChargingVoltage,
}

impl From<Setting> for Reg {
  fn from(s: Setting) -> Self {
    match s {
      Setting::BatteryMode => Reg::BatteryMode,
      Setting::ChargingCurrent => Reg::ChargingCurrent,
      Setting::ChargingVoltage => Reg::ChargingVoltage,
    }
  }
}

impl<I, D, E> Bq40z80<I, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Write a raw setting word.
  pub async fn write(&mut self, what: Setting, value: u16) -> Result<(), Error<E>> {
    self.write_word(what.into(), value).await
  }

  pub async fn set_battery_mode(&mut self, mode: BatteryMode) -> Result<(), Error<E>> {
    let raw = pack(mode).ok_or(Error::Protocol(ProtocolError::Decode))?;
    self.write(Setting::BatteryMode, raw).await
  }

  /// Charging current limit in mA.
  pub async fn set_charging_current(&mut self, ma: u16) -> Result<(), Error<E>> {
    self.write(Setting::ChargingCurrent, ma).await
  }

  /// Charging voltage limit in mV.
  pub async fn set_charging_voltage(&mut self, mv: u16) -> Result<(), Error<E>> {
    self.write(Setting::ChargingVoltage, mv).await
  }
}
