//! Human-readable battery report.
//!
//! ```
//! # fn show(snapshot: &bq40z80::BatterySnapshot) {
//! // Without a design capacity the health line is left out
//! println!("{}", snapshot);
//! println!("{}", snapshot.report(3000));
//! # }
//! ```

use core::fmt;

use crate::types::*;

/// [`BatterySnapshot`] formatter, optionally with a design capacity for the
/// health estimate.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
  snapshot: &'a BatterySnapshot,
  design_capacity: Option<u16>,
}

impl BatterySnapshot {
  /// Report including capacity health against `design_capacity` (mAh).
  pub fn report(&self, design_capacity: u16) -> Report<'_> {
    Report { snapshot: self, design_capacity: Some(design_capacity) }
  }
}

fn yes_no(flag: bool) -> &'static str {
  if flag {
    "yes"
  } else {
    "no"
  }
}

/// `m` thousandths printed as `units.mmm`.
fn milli(f: &mut fmt::Formatter<'_>, m: u32) -> fmt::Result {
  write!(f, "{}.{:03}", m / 1000, m % 1000)
}

impl fmt::Display for Report<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = self.snapshot;

    writeln!(f, "Measurements:")?;
    write!(f, "  Voltage:           ")?;
    milli(f, s.voltage as u32)?;
    writeln!(f, " V")?;
    let direction = match s.charge_state() {
      ChargeState::Charging => "charging",
      ChargeState::Discharging => "discharging",
      ChargeState::Idle => "idle",
    };
    writeln!(f, "  Current:           {} mA ({})", s.current, direction)?;
    writeln!(f, "  Temperature:       {:.1} C", s.temperature_c())?;

    writeln!(f, "Capacity:")?;
    writeln!(f, "  State of charge:   {}%", s.state_of_charge)?;
    writeln!(f, "  Remaining:         {} mAh", s.remaining_capacity)?;
    writeln!(f, "  Full charge:       {} mAh", s.full_charge_capacity)?;
    match s.cycle_count {
      0 => writeln!(f, "  Cycle count:       n/a")?,
      n => writeln!(f, "  Cycle count:       {}", n)?,
    }
    if let Some(health) = self.design_capacity.and_then(|d| s.health_percent(d)) {
      writeln!(f, "  Health:            {:.1}%", health)?;
    }

    let st = &s.status;
    writeln!(f, "Status:")?;
    writeln!(f, "  Initialized:       {}", yes_no(st.initialized))?;
    writeln!(f, "  Fully charged:     {}", yes_no(st.fully_charged))?;
    writeln!(f, "  Fully discharged:  {}", yes_no(st.fully_discharged))?;
    writeln!(f, "  Discharging:       {}", yes_no(st.discharging))?;
    if st.error_code != 0 {
      writeln!(f, "  Error code:        {:#x}", st.error_code)?;
    }

    writeln!(f, "Alarms:")?;
    let alarms = [
      (st.over_charged_alarm, "over charged"),
      (st.terminate_charge_alarm, "terminate charge"),
      (st.over_temp_alarm, "over temperature"),
      (st.terminate_discharge_alarm, "terminate discharge"),
      (st.remaining_capacity_alarm, "low capacity"),
      (st.remaining_time_alarm, "low time"),
    ];
    for (_, name) in alarms.iter().filter(|(set, _)| *set) {
      writeln!(f, "  {}", name)?;
    }
    if !st.any_alarm() {
      writeln!(f, "  none")?;
    }

    writeln!(f, "Estimates:")?;
    match (s.runtime_minutes(), s.charge_time_minutes()) {
      (Some(m), _) => writeln!(f, "  Runtime:           {} h {} min", m / 60, m % 60)?,
      (None, Some(m)) => writeln!(f, "  Time to full:      {} h {} min", m / 60, m % 60)?,
      (None, None) => writeln!(f, "  Runtime:           n/a")?,
    }
    write!(f, "  Power:             ")?;
    milli(f, s.power_mw())?;
    writeln!(f, " W")?;
    write!(f, "  Energy remaining:  ")?;
    milli(f, s.energy_remaining_mwh())?;
    writeln!(f, " Wh")?;
    write!(f, "  Energy full:       ")?;
    milli(f, s.energy_full_mwh())?;
    write!(f, " Wh")
  }
}

impl fmt::Display for BatterySnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&Report { snapshot: self, design_capacity: None }, f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::tests::snapshot;

  #[test]
  fn discharging_report() {
    let text = format!("{}", snapshot());

    assert!(text.contains("Voltage:           16.000 V"));
    assert!(text.contains("Current:           -2000 mA (discharging)"));
    assert!(text.contains("Cycle count:       12"));
    assert!(text.contains("Runtime:           0 h 45 min"));
    assert!(text.contains("Power:             32.000 W"));
    assert!(text.contains("Energy remaining:  24.000 Wh"));
    assert!(text.contains("Energy full:       48.000 Wh"));
    assert!(text.contains("Alarms:\n  none"));
    assert!(!text.contains("Health"));
    assert!(!text.contains("Error code"));
  }

  #[test]
  fn health_needs_design_capacity() {
    let text = format!("{}", snapshot().report(4000));
    assert!(text.contains("Health:            75.0%"));
  }

  #[test]
  fn alarms_and_missing_cycle_count() {
    let s = BatterySnapshot { cycle_count: 0, current: 1500, status: unpack(0x5B13).unwrap(), ..snapshot() };
    let text = format!("{}", s);

    assert!(text.contains("Cycle count:       n/a"));
    assert!(text.contains("Current:           1500 mA (charging)"));
    assert!(text.contains("Time to full:      1 h 0 min"));
    assert!(text.contains("  terminate charge\n"));
    assert!(text.contains("  low time\n"));
    assert!(!text.contains("over charged"));
    assert!(!text.contains("none"));
    assert!(text.contains("Error code:        0x3"));
  }
}
