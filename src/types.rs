use micromath::F32Ext;

/// Convert a raw SBS temperature (0.1 K) to °C.
pub fn temperature_to_c(raw: u16) -> f32 {
  (raw as f32 * 0.1) - 273.15
}

/// Convert °C to raw SBS temperature units (0.1 K), rounded and saturated to `u16`.
pub fn temperature_from_c(celsius: f32) -> u16 {
  F32Ext::round((celsius + 273.15) * 10.0) as u16
}

/// Unpack a little-endian register word into a packed bitfield struct.
pub(crate) fn unpack<T: TryFrom<[u8; 2]>>(raw: u16) -> Option<T> {
  T::try_from(raw.to_le_bytes()).ok()
}

/// Pack a bitfield struct back into its register word.
pub(crate) fn pack<T: TryInto<[u8; 2]>>(v: T) -> Option<u16> {
  v.try_into().ok().map(u16::from_le_bytes)
}

/// `BatteryStatus()` (0x16) flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 2)]
pub struct BatteryStatus {
  /// Result of the last SBS command (0 = OK, 1 = busy, 2 = reserved command, ...).
  #[bits(4)]
  pub error_code: u8,
  #[bits(1)]
  pub fully_discharged: bool,
  #[bits(1)]
  pub fully_charged: bool,
  #[bits(1)]
  pub discharging: bool,
  #[bits(1)]
  pub initialized: bool,
  /// RTA: remaining time to depletion below `RemainingTimeAlarm()`.
  #[bits(1)]
  pub remaining_time_alarm: bool,
  /// RCA: remaining capacity below `RemainingCapacityAlarm()`.
  #[bits(1)]
  pub remaining_capacity_alarm: bool,
  #[skip(1)]
  #[bits(1)]
  pub terminate_discharge_alarm: bool,
  #[bits(1)]
  pub over_temp_alarm: bool,
  #[skip(1)]
  #[bits(1)]
  pub terminate_charge_alarm: bool,
  #[bits(1)]
  pub over_charged_alarm: bool,
}

impl BatteryStatus {
  /// Any of the six alarm bits set.
  pub fn any_alarm(&self) -> bool {
    self.over_charged_alarm
      || self.terminate_charge_alarm
      || self.over_temp_alarm
      || self.terminate_discharge_alarm
      || self.remaining_capacity_alarm
      || self.remaining_time_alarm
  }
}

/// `BatteryMode()` (0x03) bits.
///
/// A healthy pack typically reads `0x6081`: ICC, CF, AM and CHGM set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 2)]
pub struct BatteryMode {
  /// ICC: internal charge controller supported.
  #[bits(1)]
  pub internal_charge_controller: bool,
  /// PBS: primary battery support.
  #[bits(1)]
  pub primary_battery_support: bool,
  /// CF: conditioning cycle requested.
  #[skip(5)]
  #[bits(1)]
  pub condition_flag: bool,
  /// CC: internal charge controller enabled.
  #[bits(1)]
  pub charge_controller_enabled: bool,
  /// PB: operating as primary battery.
  #[bits(1)]
  pub primary_battery: bool,
  /// AM: `AlarmWarning()` broadcasts to host and charger disabled.
  #[skip(3)]
  #[bits(1)]
  pub alarm_mode: bool,
  /// CHGM: `ChargingVoltage()`/`ChargingCurrent()` broadcasts disabled.
  #[bits(1)]
  pub charger_mode: bool,
  /// CAPM: capacity reported in 10 mW units instead of mA.
  #[bits(1)]
  pub capacity_mode: bool,
}

/// One pass over the gauge's live telemetry, see
/// [`Bq40z80::read_snapshot`](crate::Bq40z80::read_snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatterySnapshot {
  /// mV
  pub voltage: u16,
  /// mA, positive while charging
  pub current: i16,
  /// 0.1 K
  pub temperature: u16,
  /// %
  pub state_of_charge: u8,
  /// mAh
  pub remaining_capacity: u16,
  /// mAh
  pub full_charge_capacity: u16,
  /// Zero when the count could not be read.
  pub cycle_count: u16,
  pub status: BatteryStatus,
}

/// Direction of the pack current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeState {
  Charging,
  Discharging,
  Idle,
}

impl BatterySnapshot {
  pub fn temperature_c(&self) -> f32 {
    temperature_to_c(self.temperature)
  }

  pub fn charge_state(&self) -> ChargeState {
    match self.current {
      c if c > 0 => ChargeState::Charging,
      c if c < 0 => ChargeState::Discharging,
      _ => ChargeState::Idle,
    }
  }

  /// Instantaneous power in mW, regardless of direction.
  pub fn power_mw(&self) -> u32 {
    self.voltage as u32 * self.current.unsigned_abs() as u32 / 1000
  }

  /// Minutes until empty at the present discharge current.
  pub fn runtime_minutes(&self) -> Option<u32> {
    match self.charge_state() {
      ChargeState::Discharging => Some(self.remaining_capacity as u32 * 60 / self.current.unsigned_abs() as u32),
      _ => None,
    }
  }

  /// Minutes until full at the present charge current.
  pub fn charge_time_minutes(&self) -> Option<u32> {
    if self.charge_state() != ChargeState::Charging || self.state_of_charge >= 100 {
      return None;
    }
    let missing = self.full_charge_capacity.saturating_sub(self.remaining_capacity) as u32;
    Some(missing * 60 / self.current as u32)
  }

  /// Remaining energy at the present voltage, mWh.
  pub fn energy_remaining_mwh(&self) -> u32 {
    self.remaining_capacity as u32 * self.voltage as u32 / 1000
  }

  /// Energy of a full charge at the present voltage, mWh.
  pub fn energy_full_mwh(&self) -> u32 {
    self.full_charge_capacity as u32 * self.voltage as u32 / 1000
  }

  /// Full-charge capacity relative to `design_capacity` (mAh), in %.
  pub fn health_percent(&self, design_capacity: u16) -> Option<f32> {
    if design_capacity == 0 {
      return None;
    }
    Some(self.full_charge_capacity as f32 / design_capacity as f32 * 100.0)
  }
}
