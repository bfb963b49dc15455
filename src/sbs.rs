//! Typed SBS readings.
//!
//! Every 16-bit reading goes through the same chain:
//!
//! 1. SMBus Read Word on the SBS register.
//! 2. If the transfer fails, or the gauge answers with the frozen sentinel
//!    `0x16CC`, the same register is requested through
//!    ManufacturerBlockAccess (0x44) and the echoed command is verified.
//!
//! The narrower accessors ([`read_i16`](crate::Bq40z80::read_i16),
//! [`read_u8`](crate::Bq40z80::read_u8)) are views over
//! [`read_u16`](crate::Bq40z80::read_u16). Name blocks are read directly, without
//! fallback.
//!
//! # Examples
//!
//! ```no_run
//! # use embedded_hal_async::{delay::DelayNs, i2c::I2c};
//! # async fn example<I: I2c, D: DelayNs>(mut gauge: bq40z80::Bq40z80<I, D>) -> Result<(), bq40z80::Error<I::Error>> {
//! use bq40z80::Reading;
//!
//! let current_ma = gauge.read_i16(Reading::Current).await?;
//! let soc = gauge.read_u8(Reading::StateOfCharge).await?;
//! let name = gauge.read_string(Reading::DeviceName).await?;
//! let status = gauge.read_status().await?;
//! # let _ = (current_ma, soc, name, status);
//! # Ok(())
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};
use heapless::String;

use crate::{defs::*, types::*, Bq40z80, Error, ProtocolError};

/// Quantities that can be read from the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
  /// 0.1 K
  Temperature,
  /// mV
  Voltage,
  /// mA, signed (+ charging, - discharging)
  Current,
  /// Bitfield, see [`BatteryMode`]
  BatteryMode,
  /// %, low byte of the word
  StateOfCharge,
  /// mAh
  RemainingCapacity,
  /// mAh
  FullChargeCapacity,
  /// Bitfield, see [`BatteryStatus`]
  BatteryStatus,
  CycleCount,
  SerialNumber,
  /// ASCII block
  ManufacturerName,
  /// ASCII block
  DeviceName,
}

impl Reading {
  /// SBS command code of this reading.
  pub fn command(self) -> u8 {
    Reg::from(self).into()
  }

  /// Block (string) readings, as opposed to word readings.
  pub fn is_block(self) -> bool {
    matches!(self, Reading::ManufacturerName | Reading::DeviceName)
  }
}

impl From<Reading> for Reg {
  fn from(r: Reading) -> Self {
    match r {
      Reading::Temperature => Reg::Temperature,
      Reading::Voltage => Reg::Voltage,
      Reading::Current => Reg::Current,
      Reading::BatteryMode => Reg::BatteryMode,
      Reading::StateOfCharge => Reg::RelativeStateOfCharge,
      Reading::RemainingCapacity => Reg::RemainingCapacity,
      Reading::FullChargeCapacity => Reg::FullChargeCapacity,
      Reading::BatteryStatus => Reg::BatteryStatus,
      Reading::CycleCount => Reg::CycleCount,
      Reading::SerialNumber => Reg::SerialNumber,
      Reading::ManufacturerName => Reg::ManufacturerName,
      Reading::DeviceName => Reg::DeviceName,
    }
  }
}

/// How the gauge answered a direct SBS word read.
pub(crate) enum Liveness<E> {
  /// Live register content.
  Responding(u16),
  /// The sealed/frozen sentinel instead of data.
  Frozen,
  /// The transfer itself failed.
  Unreachable(Error<E>),
}

impl<I, D, E> Bq40z80<I, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Read a 16-bit quantity, falling back to ManufacturerBlockAccess when the
  /// direct read fails or returns the frozen sentinel.
  ///
  /// Returns [`Error::InvalidParameter`] for block readings.
  pub async fn read_u16(&mut self, what: Reading) -> Result<u16, Error<E>> {
    if what.is_block() {
      return Err(Error::InvalidParameter);
    }

    let reg = Reg::from(what);
    match self.probe(reg).await {
      Liveness::Responding(v) => Ok(v),
      Liveness::Frozen => {
        warn!("SBS {:#x} returned frozen sentinel, trying ManufacturerBlockAccess", u8::from(reg));
        self.mba_read_word(u8::from(reg).into()).await
      }
      Liveness::Unreachable(e) => {
        warn!("SBS {:#x} read failed ({}), trying ManufacturerBlockAccess", u8::from(reg), e.describe());
        self.mba_read_word(u8::from(reg).into()).await
      }
    }
  }

  /// Signed view of [`read_u16`](Self::read_u16).
  pub async fn read_i16(&mut self, what: Reading) -> Result<i16, Error<E>> {
    Ok(self.read_u16(what).await? as i16)
  }

  /// Low byte of [`read_u16`](Self::read_u16).
  pub async fn read_u8(&mut self, what: Reading) -> Result<u8, Error<E>> {
    Ok((self.read_u16(what).await? & 0xFF) as u8)
  }

  /// Read a name block. A single trailing NUL is dropped.
  ///
  /// Returns [`Error::InvalidParameter`] for word readings.
  pub async fn read_string(&mut self, what: Reading) -> Result<String<MAX_BLOCK_LEN>, Error<E>> {
    if !what.is_block() {
      return Err(Error::InvalidParameter);
    }

    let mut bytes = self.read_block(what.into()).await?;
    if bytes.last() == Some(&0) {
      bytes.pop();
    }
    String::from_utf8(bytes).map_err(|_| Error::Protocol(ProtocolError::InvalidString))
  }

  /// Read and decode `BatteryStatus()`.
  pub async fn read_status(&mut self) -> Result<BatteryStatus, Error<E>> {
    let raw = self.read_u16(Reading::BatteryStatus).await?;
    trace!("BatteryStatus {:#x}", raw);
    unpack(raw).ok_or(Error::Protocol(ProtocolError::Decode))
  }

  /// Read voltage, current, temperature, state of charge, both capacities,
  /// cycle count and status in one pass, spaced by the command delay.
  ///
  /// The cycle count is best-effort and reads as zero when it cannot be
  /// obtained; any other failure aborts the snapshot.
  pub async fn read_snapshot(&mut self) -> Result<BatterySnapshot, Error<E>> {
    let voltage = self.read_u16(Reading::Voltage).await?;
    self.command_delay().await;
    let current = self.read_i16(Reading::Current).await?;
    self.command_delay().await;
    let temperature = self.read_u16(Reading::Temperature).await?;
    self.command_delay().await;
    let state_of_charge = self.read_u8(Reading::StateOfCharge).await?;
    self.command_delay().await;
    let remaining_capacity = self.read_u16(Reading::RemainingCapacity).await?;
    self.command_delay().await;
    let full_charge_capacity = self.read_u16(Reading::FullChargeCapacity).await?;
    self.command_delay().await;

    let cycle_count = match self.read_u16(Reading::CycleCount).await {
      Ok(n) => n,
      Err(_) => {
        warn!("CycleCount unavailable, reporting 0");
        0
      }
    };
    self.command_delay().await;

    let status = self.read_status().await?;

    Ok(BatterySnapshot {
      voltage,
      current,
      temperature,
      state_of_charge,
      remaining_capacity,
      full_charge_capacity,
      cycle_count,
      status,
    })
  }

  /// Pack voltage in mV.
  pub async fn get_voltage(&mut self) -> Result<u16, Error<E>> {
    self.read_u16(Reading::Voltage).await
  }

  /// Pack current in mA (+ charging, - discharging).
  pub async fn get_current(&mut self) -> Result<i16, Error<E>> {
    self.read_i16(Reading::Current).await
  }

  /// Temperature in 0.1 K.
  pub async fn get_temperature_raw(&mut self) -> Result<u16, Error<E>> {
    self.read_u16(Reading::Temperature).await
  }

  pub async fn get_temperature_c(&mut self) -> Result<f32, Error<E>> {
    Ok(temperature_to_c(self.get_temperature_raw().await?))
  }

  /// Relative state of charge in %.
  pub async fn get_state_of_charge(&mut self) -> Result<u8, Error<E>> {
    self.read_u8(Reading::StateOfCharge).await
  }

  pub async fn get_remaining_capacity(&mut self) -> Result<u16, Error<E>> {
    self.read_u16(Reading::RemainingCapacity).await
  }

  pub async fn get_full_charge_capacity(&mut self) -> Result<u16, Error<E>> {
    self.read_u16(Reading::FullChargeCapacity).await
  }

  pub async fn get_cycle_count(&mut self) -> Result<u16, Error<E>> {
    self.read_u16(Reading::CycleCount).await
  }

  pub async fn get_serial_number(&mut self) -> Result<u16, Error<E>> {
    self.read_u16(Reading::SerialNumber).await
  }

  pub async fn get_battery_mode(&mut self) -> Result<BatteryMode, Error<E>> {
    let raw = self.read_u16(Reading::BatteryMode).await?;
    unpack(raw).ok_or(Error::Protocol(ProtocolError::Decode))
  }

  pub async fn get_manufacturer_name(&mut self) -> Result<String<MAX_BLOCK_LEN>, Error<E>> {
    self.read_string(Reading::ManufacturerName).await
  }

  pub async fn get_device_name(&mut self) -> Result<String<MAX_BLOCK_LEN>, Error<E>> {
    self.read_string(Reading::DeviceName).await
  }

  /// One direct SBS word read, classified. Never falls back.
  pub(crate) async fn probe(&mut self, reg: Reg) -> Liveness<E> {
    match self.read_word(reg).await {
      Ok(FROZEN_SENTINEL) => Liveness::Frozen,
      Ok(v) => Liveness::Responding(v),
      Err(e) => Liveness::Unreachable(e),
    }
  }
}
