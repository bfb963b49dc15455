#![allow(dead_code)]

/// SBS command codes (BQ40Z80 TRM, chapter 17).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Reg {
  ManufacturerAccess = 0x00,
  BatteryMode = 0x03,
  Temperature = 0x08,
  Voltage = 0x09,
  Current = 0x0A,
  RelativeStateOfCharge = 0x0D,
  RemainingCapacity = 0x0F,
  FullChargeCapacity = 0x10,
  ChargingCurrent = 0x14,
  ChargingVoltage = 0x15,
  BatteryStatus = 0x16,
  CycleCount = 0x17,
  SerialNumber = 0x1C,
  ManufacturerName = 0x20,
  DeviceName = 0x21,
  ManufacturerBlockAccess = 0x44,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

/// Value every SBS register reads back while the gauge is sealed/frozen.
pub(crate) const FROZEN_SENTINEL: u16 = 0x16CC;

/// BatteryMode of a healthy, factory-configured pack.
pub(crate) const BATTERY_MODE_NOMINAL: u16 = 0x6081;

// SMBus block transfers
pub(crate) const MAX_BLOCK_LEN: usize = 32;
pub(crate) const MBA_HEADER_LEN: usize = 2;

// Timing, all in ms
pub(crate) const MAC_PROCESSING_DELAY: u32 = 100;
pub(crate) const RESET_DELAY: u32 = 100;
pub(crate) const RECOVERY_RESET_DELAY: u32 = 500;
pub(crate) const UNSEAL_KEY1_DELAY: u32 = 10;
pub(crate) const UNSEAL_KEY2_DELAY: u32 = 100;
pub(crate) const BUS_REINIT_SETTLE_DELAY: u32 = 10;

// SMBus address (7-bit)
pub(crate) const ADDR_DEFAULT: u8 = 0x0B;
