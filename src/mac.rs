//! ManufacturerAccess sub-commands.
//!
//! The BQ40Z80 exposes two vendor channels and they must not be confused:
//!
//! - `ManufacturerAccess()` (0x00): unframed passthrough. A 16-bit command
//!   word, optionally followed by a data word, written to register 0x00.
//!   Used for trigger-style commands (reset, seal, unseal keys).
//! - `ManufacturerBlockAccess()` (0x44): length-framed block access. The
//!   command goes out as a block write, the answer comes back as a block read
//!   that starts with the echoed command: `[cmd_lo, cmd_hi, data...]`.
//!
//! # Examples
//!
//! ```no_run
//! # use embedded_hal_async::{delay::DelayNs, i2c::I2c};
//! # async fn example<I: I2c, D: DelayNs>(mut gauge: bq40z80::Bq40z80<I, D>) -> Result<(), bq40z80::Error<I::Error>> {
//! use bq40z80::MacCommand;
//!
//! let device_type = gauge.read_mac(MacCommand::DeviceType).await?;
//! let firmware = gauge.read_mac_block(MacCommand::FirmwareVersion).await?;
//! # let _ = (device_type, firmware);
//! # Ok(())
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};
use heapless::Vec;

use crate::{defs::*, Bq40z80, Error, ProtocolError};

/// ManufacturerAccess sub-command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum MacCommand {
  DeviceType = 0x0001,
  FirmwareVersion = 0x0002,
  HardwareVersion = 0x0003,
  InstructionFlashChecksum = 0x0004,
  StaticDfSignature = 0x0005,
  ChemId = 0x0006,
  ShutdownMode = 0x0010,
  SleepMode = 0x0011,
  SealDevice = 0x0030,
  DeviceReset = 0x0041,
  /// First word of the default unseal key
  UnsealKey1 = 0x0414,
  /// Second word of the default unseal key
  UnsealKey2 = 0x3672,
}

impl From<MacCommand> for u16 {
  #[inline]
  fn from(c: MacCommand) -> Self {
    c as u16
  }
}

impl<I, D, E> Bq40z80<I, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Read the 16-bit result of a sub-command through ManufacturerBlockAccess.
  pub async fn read_mac(&mut self, cmd: MacCommand) -> Result<u16, Error<E>> {
    self.mba_read_word(cmd.into()).await
  }

  /// Read the full answer of a sub-command (command echo stripped).
  pub async fn read_mac_block(&mut self, cmd: MacCommand) -> Result<Vec<u8, MAX_BLOCK_LEN>, Error<E>> {
    let mut block = self.mba_read(cmd.into()).await?;
    block.rotate_left(MBA_HEADER_LEN);
    block.truncate(block.len() - MBA_HEADER_LEN);
    Ok(block)
  }

  /// Send a sub-command through the ManufacturerAccess passthrough.
  ///
  /// A `value` of zero sends the command alone (trigger-style commands);
  /// anything else is written as a data word after the command.
  pub async fn write_mac(&mut self, cmd: MacCommand, value: u16) -> Result<(), Error<E>> {
    self.mac_command(cmd.into()).await?;
    if value != 0 {
      self.command_delay().await;
      self.write_word(Reg::ManufacturerAccess, value).await?;
    }
    Ok(())
  }

  /// Reset the gauge (`DeviceReset`) and wait for it to restart.
  pub async fn reset(&mut self) -> Result<(), Error<E>> {
    self.mac_command(MacCommand::DeviceReset.into()).await?;
    self.delay.delay_ms(RESET_DELAY).await;
    Ok(())
  }

  /// Send the default unseal key pair.
  pub async fn unseal(&mut self) -> Result<(), Error<E>> {
    self.mac_command(MacCommand::UnsealKey1.into()).await?;
    self.delay.delay_ms(UNSEAL_KEY1_DELAY).await;
    self.mac_command(MacCommand::UnsealKey2.into()).await?;
    self.delay.delay_ms(UNSEAL_KEY2_DELAY).await;
    Ok(())
  }

  /// Return the gauge to SEALED mode.
  pub async fn seal(&mut self) -> Result<(), Error<E>> {
    self.mac_command(MacCommand::SealDevice.into()).await
  }

  /// ManufacturerAccess passthrough: command word to register 0x00.
  pub(crate) async fn mac_command(&mut self, cmd: u16) -> Result<(), Error<E>> {
    self.write_word(Reg::ManufacturerAccess, cmd).await
  }

  /// ManufacturerBlockAccess request returning the result word at bytes 2..4.
  pub(crate) async fn mba_read_word(&mut self, cmd: u16) -> Result<u16, Error<E>> {
    let block = self.mba_read(cmd).await?;
    Ok(u16::from_le_bytes([block[2], block[3]]))
  }

  /// ManufacturerBlockAccess request. Returns the raw answer after checking that
  /// it holds at least the echo and one result word and that the echo matches.
  async fn mba_read(&mut self, cmd: u16) -> Result<Vec<u8, MAX_BLOCK_LEN>, Error<E>> {
    self.write_block(Reg::ManufacturerBlockAccess, &cmd.to_le_bytes()).await?;
    self.delay.delay_ms(MAC_PROCESSING_DELAY).await;
    let block = self.read_block(Reg::ManufacturerBlockAccess).await?;

    if block.len() < MBA_HEADER_LEN + 2 {
      warn!("MBA {:#x}: short answer, {} bytes", cmd, block.len());
      return Err(Error::Protocol(ProtocolError::ShortResponse(block.len())));
    }

    let echoed = u16::from_le_bytes([block[0], block[1]]);
    if echoed != cmd {
      warn!("MBA {:#x}: answer echoes {:#x}, discarding", cmd, echoed);
      return Err(Error::Protocol(ProtocolError::EchoMismatch { sent: cmd, echoed }));
    }

    trace!("MBA {:#x}: {} bytes", cmd, block.len());
    Ok(block)
  }
}
