use core::future::Future;

use embassy_futures::select::{select, Either};
use embedded_hal_async::{delay::DelayNs, i2c::*};
use heapless::Vec;

use crate::{defs::*, Bq40z80, Error, ProtocolError};

impl<I, D, E> Bq40z80<I, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// SMBus Read Word: command byte, repeated start, two bytes LSB first.
  pub(crate) async fn read_word(&mut self, cmd: Reg) -> Result<u16, Error<E>> {
    let mut b = [0u8; 2];
    let res = with_timeout(
      &mut self.delay,
      self.config.bus_timeout_ms,
      self.i2c.write_read(self.config.address, &[cmd.into()], &mut b),
    )
    .await;
    self.command_delay().await;

    res?;
    Ok(u16::from_le_bytes(b))
  }

  /// SMBus Write Word: `[cmd, lo, hi]` in one transfer.
  pub(crate) async fn write_word(&mut self, cmd: Reg, value: u16) -> Result<(), Error<E>> {
    let [lo, hi] = value.to_le_bytes();
    let res = with_timeout(
      &mut self.delay,
      self.config.bus_timeout_ms,
      self.i2c.write(self.config.address, &[cmd.into(), lo, hi]),
    )
    .await;
    self.command_delay().await;
    res
  }

  /// SMBus Block Read. Clocks in the length byte plus the 32-byte maximum and
  /// returns the payload trimmed to the reported length.
  pub(crate) async fn read_block(&mut self, cmd: Reg) -> Result<Vec<u8, MAX_BLOCK_LEN>, Error<E>> {
    let mut b = [0u8; MAX_BLOCK_LEN + 1];
    let res = with_timeout(
      &mut self.delay,
      self.config.bus_timeout_ms,
      self.i2c.write_read(self.config.address, &[cmd.into()], &mut b),
    )
    .await;
    self.command_delay().await;
    res?;

    let len = b[0];
    if len as usize > MAX_BLOCK_LEN {
      warn!("block read {:#x}: length byte {} exceeds 32", u8::from(cmd), len);
      return Err(Error::Protocol(ProtocolError::BlockLength(len)));
    }

    // Cannot fail, `len` was checked against the capacity above.
    Vec::from_slice(&b[1..=len as usize]).map_err(|_| Error::Protocol(ProtocolError::BlockLength(len)))
  }

  /// SMBus Block Write: `[cmd, len, data...]` in one transfer.
  pub(crate) async fn write_block(&mut self, cmd: Reg, data: &[u8]) -> Result<(), Error<E>> {
    if data.len() > MAX_BLOCK_LEN {
      warn!("block write {:#x}: {} bytes exceeds 32", u8::from(cmd), data.len());
      return Err(Error::InvalidParameter);
    }

    let mut buf = [0u8; MAX_BLOCK_LEN + 2];
    let len = 2 + data.len();
    buf[0] = cmd.into();
    buf[1] = data.len() as u8;
    buf[2..len].copy_from_slice(data);

    let res = with_timeout(
      &mut self.delay,
      self.config.bus_timeout_ms,
      self.i2c.write(self.config.address, &buf[..len]),
    )
    .await;
    self.command_delay().await;
    res
  }

  /// Minimum spacing the gauge needs between two commands.
  pub(crate) async fn command_delay(&mut self) {
    self.delay.delay_ms(self.config.command_delay_ms).await;
  }
}

/// Race a bus transfer against the delay provider. `timeout_ms == 0` waits for the transfer alone.
async fn with_timeout<D, F, E>(delay: &mut D, timeout_ms: u32, transfer: F) -> Result<(), Error<E>>
where
  D: DelayNs,
  F: Future<Output = Result<(), E>>,
{
  if timeout_ms == 0 {
    return transfer.await.map_err(Error::I2c);
  }

  match select(transfer, delay.delay_ms(timeout_ms)).await {
    Either::First(res) => res.map_err(Error::I2c),
    Either::Second(()) => Err(Error::Timeout),
  }
}

#[cfg(test)]
mod tests {
  use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
  };

  use super::*;
  use crate::testing::*;

  #[test]
  fn word_round_trip_keeps_byte_order() {
    block_on(async {
      let expectations = [word_read(0x09, 0x2710), word_write(0x09, 0x2710)];
      let mut i2c = I2cMock::new(&expectations);
      let mut gauge = Bq40z80::new(&mut i2c, Delays::default());

      let v = gauge.read_word(Reg::Voltage).await.unwrap();
      assert_eq!(v, 10_000);
      gauge.write_word(Reg::Voltage, v).await.unwrap();

      i2c.done();
    });
  }

  #[test]
  fn every_primitive_spaces_commands() {
    block_on(async {
      let expectations = [
        word_read(0x03, 0x6081),
        word_write(0x15, 16_800),
        block_read(0x20, b"TI"),
        block_write(0x44, &[0x01, 0x00]),
      ];
      let mut i2c = I2cMock::new(&expectations);
      let mut delay = Delays::default();
      let cfg = crate::Config { command_delay_ms: 3, ..Default::default() };
      let mut gauge = Bq40z80::with_config(&mut i2c, &mut delay, cfg);

      gauge.read_word(Reg::BatteryMode).await.unwrap();
      gauge.write_word(Reg::ChargingVoltage, 16_800).await.unwrap();
      gauge.read_block(Reg::ManufacturerName).await.unwrap();
      gauge.write_block(Reg::ManufacturerBlockAccess, &[0x01, 0x00]).await.unwrap();

      i2c.done();
      assert_eq!(delay.ms, [3, 3, 3, 3]);
    });
  }

  #[test]
  fn transport_error_is_reported_and_still_spaced() {
    block_on(async {
      let expectations = [word_read_err(0x0A)];
      let mut i2c = I2cMock::new(&expectations);
      let mut delay = Delays::default();
      let mut gauge = Bq40z80::new(&mut i2c, &mut delay);

      let err = gauge.read_word(Reg::Current).await.unwrap_err();
      assert!(matches!(err, Error::I2c(ErrorKind::Other)));

      i2c.done();
      assert_eq!(delay.ms, [1]);
    });
  }

  #[test]
  fn block_read_trims_to_length() {
    block_on(async {
      let expectations = [block_read(0x21, b"bq40z80")];
      let mut i2c = I2cMock::new(&expectations);
      let mut gauge = Bq40z80::new(&mut i2c, Delays::default());

      let data = gauge.read_block(Reg::DeviceName).await.unwrap();
      assert_eq!(&data[..], b"bq40z80");

      i2c.done();
    });
  }

  #[test]
  fn block_read_rejects_oversized_length() {
    block_on(async {
      let expectations = [block_read_raw(0x20, 33, &[0xAA; 32])];
      let mut i2c = I2cMock::new(&expectations);
      let mut gauge = Bq40z80::new(&mut i2c, Delays::default());

      let err = gauge.read_block(Reg::ManufacturerName).await.unwrap_err();
      assert!(matches!(err, Error::Protocol(ProtocolError::BlockLength(33))));

      i2c.done();
    });
  }

  #[test]
  fn block_write_frames_length() {
    block_on(async {
      let expectations = [block_write(0x44, &[0x41, 0x00])];
      let mut i2c = I2cMock::new(&expectations);
      let mut gauge = Bq40z80::new(&mut i2c, Delays::default());

      gauge.write_block(Reg::ManufacturerBlockAccess, &[0x41, 0x00]).await.unwrap();

      i2c.done();
    });
  }

  #[test]
  fn block_write_rejects_oversized_payload() {
    block_on(async {
      let mut i2c = silent_bus();
      let mut gauge = Bq40z80::new(&mut i2c, Delays::default());

      let err = gauge.write_block(Reg::ManufacturerBlockAccess, &[0u8; 33]).await.unwrap_err();
      assert!(matches!(err, Error::InvalidParameter));

      i2c.done();
    });
  }

  struct Stalled;

  impl Future for Stalled {
    type Output = Result<(), ErrorKind>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
      Poll::Pending
    }
  }

  #[test]
  fn stalled_transfer_times_out() {
    block_on(async {
      let mut delay = Delays::default();
      let res = with_timeout(&mut delay, 25, Stalled).await;

      assert!(matches!(res, Err(Error::Timeout)));
      assert_eq!(delay.ms, [25]);
    });
  }

  #[test]
  fn completed_transfer_wins_the_race() {
    block_on(async {
      let mut delay = Delays::default();
      let res = with_timeout(&mut delay, 25, async { Err::<(), _>(ErrorKind::Bus) }).await;

      assert!(matches!(res, Err(Error::I2c(ErrorKind::Bus))));
      assert!(delay.ms.is_empty());
    });
  }
}
