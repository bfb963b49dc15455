//! Shared test scaffolding: scripted SMBus traffic and a recording delay.

use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;

pub(crate) use embassy_futures::block_on;
pub(crate) use embedded_hal_async::i2c::ErrorKind;
pub(crate) use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

pub(crate) const ADDR: u8 = 0x0B;

/// Records every requested wait in milliseconds.
#[derive(Debug, Default)]
pub(crate) struct Delays {
  pub(crate) ms: Vec<u32>,
}

impl Delays {
  /// Waits other than the 1 ms inter-command spacing.
  pub(crate) fn long_waits(&self) -> Vec<u32> {
    self.ms.iter().copied().filter(|&ms| ms > 1).collect()
  }
}

impl DelayNs for Delays {
  async fn delay_ns(&mut self, ns: u32) {
    self.ms.push(ns / 1_000_000);
  }

  async fn delay_ms(&mut self, ms: u32) {
    self.ms.push(ms);
  }
}

pub(crate) fn word_read(cmd: u8, value: u16) -> I2cTransaction {
  I2cTransaction::write_read(ADDR, vec![cmd], value.to_le_bytes().to_vec())
}

pub(crate) fn word_read_err(cmd: u8) -> I2cTransaction {
  I2cTransaction::write_read(ADDR, vec![cmd], vec![0, 0]).with_error(ErrorKind::Other)
}

pub(crate) fn word_write(cmd: u8, value: u16) -> I2cTransaction {
  let [lo, hi] = value.to_le_bytes();
  I2cTransaction::write(ADDR, vec![cmd, lo, hi])
}

pub(crate) fn block_write(cmd: u8, data: &[u8]) -> I2cTransaction {
  let mut frame = vec![cmd, data.len() as u8];
  frame.extend_from_slice(data);
  I2cTransaction::write(ADDR, frame)
}

pub(crate) fn block_write_err(cmd: u8, data: &[u8]) -> I2cTransaction {
  block_write(cmd, data).with_error(ErrorKind::Other)
}

/// Block read answered with `payload`, zero padded to the 33 bytes the driver clocks in.
pub(crate) fn block_read(cmd: u8, payload: &[u8]) -> I2cTransaction {
  block_read_raw(cmd, payload.len() as u8, payload)
}

/// Block read with an arbitrary length byte.
pub(crate) fn block_read_raw(cmd: u8, len: u8, payload: &[u8]) -> I2cTransaction {
  let mut frame = vec![0u8; 33];
  frame[0] = len;
  frame[1..1 + payload.len()].copy_from_slice(payload);
  I2cTransaction::write_read(ADDR, vec![cmd], frame)
}

/// ManufacturerBlockAccess exchange: command written to 0x44, `response` read back.
pub(crate) fn mba(cmd: u16, response: &[u8]) -> [I2cTransaction; 2] {
  [block_write(0x44, &cmd.to_le_bytes()), block_read(0x44, response)]
}

/// Bus that expects no traffic at all.
pub(crate) fn silent_bus() -> I2cMock {
  I2cMock::new(&Vec::<I2cTransaction>::new())
}
