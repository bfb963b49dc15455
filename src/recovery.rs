//! Initialization probe and device recovery.
//!
//! [`init`](crate::Bq40z80::init) reads `BatteryMode()` once. A gauge that
//! answers with the frozen sentinel gets one recovery attempt (device reset
//! followed by the default unseal key pair) and is probed again. The outcome is
//! reported as a [`Health`] value, never as an error, and is not remembered by
//! the driver: later reads find their own way through the block-access fallback.
//!
//! [`reset_bus`](crate::Bq40z80::reset_bus) is the last resort for a wedged bus
//! and needs the bus type to implement [`BusRecovery`].

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::*, sbs::Liveness, Bq40z80, Error, MacCommand};

/// Outcome of [`Bq40z80::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Health {
  /// Gauge answered the probe with real data.
  Normal,
  /// Gauge was frozen and answers normally after reset and unseal.
  Recovered,
  /// Gauge still answers with the frozen sentinel after recovery.
  Unrecoverable,
  /// Probe failed on the bus. Block access may still work.
  Unreachable,
}

impl Health {
  /// The gauge was seen returning real register data.
  pub fn is_confirmed(self) -> bool {
    matches!(self, Health::Normal | Health::Recovered)
  }
}

/// Bus types that can tear down and bring back up their peripheral.
///
/// This is a heavy operation (peripheral deinit and reinit), meant for a bus
/// stuck with SDA held low, not for retrying a failed command.
#[allow(async_fn_in_trait)]
pub trait BusRecovery: ErrorType {
  async fn reinit(&mut self) -> Result<(), Self::Error>;
}

impl<T: BusRecovery + ?Sized> BusRecovery for &mut T {
  #[inline]
  async fn reinit(&mut self) -> Result<(), Self::Error> {
    T::reinit(self).await
  }
}

impl<I, D, E> Bq40z80<I, D>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Probe the gauge and try to recover it when it is frozen.
  ///
  /// Never fails. A result other than [`Health::Normal`] or
  /// [`Health::Recovered`] means the driver is usable but the device was not
  /// confirmed healthy.
  pub async fn init(&mut self) -> Health {
    info!("probing gauge at {:#x}", self.bus.write);

    match self.probe(Reg::BatteryMode).await {
      Liveness::Responding(mode) => {
        info!("BatteryMode {:#x}, gauge responding", mode);
        if mode != BATTERY_MODE_NOMINAL {
          debug!("BatteryMode differs from nominal {:#x}", BATTERY_MODE_NOMINAL);
        }
        Health::Normal
      }
      Liveness::Unreachable(e) => {
        warn!("init probe failed ({}), continuing without confirmation", e.describe());
        Health::Unreachable
      }
      Liveness::Frozen => {
        warn!("gauge frozen (BatteryMode {:#x}), attempting recovery", FROZEN_SENTINEL);
        self.recover().await
      }
    }
  }

  async fn recover(&mut self) -> Health {
    self.recovery_step(MacCommand::DeviceReset, RECOVERY_RESET_DELAY).await;
    self.recovery_step(MacCommand::UnsealKey1, UNSEAL_KEY1_DELAY).await;
    self.recovery_step(MacCommand::UnsealKey2, UNSEAL_KEY2_DELAY).await;

    match self.probe(Reg::BatteryMode).await {
      Liveness::Responding(mode) => {
        info!("recovery succeeded, BatteryMode {:#x}", mode);
        Health::Recovered
      }
      Liveness::Frozen => {
        error!("recovery failed, gauge still frozen");
        Health::Unrecoverable
      }
      Liveness::Unreachable(e) => {
        error!("recovery failed, re-probe: {}", e.describe());
        Health::Unrecoverable
      }
    }
  }

  /// One passthrough command of the recovery sequence. A failed write is
  /// logged and the sequence carries on.
  async fn recovery_step(&mut self, cmd: MacCommand, wait_ms: u32) {
    let code = u16::from(cmd);
    debug!("recovery: MAC {:#x}", code);
    if let Err(e) = self.mac_command(code).await {
      warn!("recovery: MAC {:#x} not sent ({})", code, e.describe());
    }
    self.delay.delay_ms(wait_ms).await;
  }

  /// Deinitialize and reinitialize the bus peripheral, then let it settle.
  pub async fn reset_bus(&mut self) -> Result<(), Error<E>>
  where
    I: BusRecovery,
  {
    warn!("reinitializing bus peripheral");
    self.i2c.reinit().await.map_err(Error::I2c)?;
    self.delay.delay_ms(BUS_REINIT_SETTLE_DELAY).await;
    Ok(())
  }
}
