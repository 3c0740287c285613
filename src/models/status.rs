use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::utils::{AppError, AppResult};

static RE_REMAINING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("valid remaining-time regex"));

pub const UNKNOWN_REMAINING: &str = "unknown";

/// One parsed `venti status_csv` record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatusSnapshot {
    pub percentage: u8,
    /// `H:MM`/`HH:MM`, or `"unknown"`.
    pub time_remaining: String,
    pub is_charging: bool,
    pub is_discharge_forced: bool,
    pub maintain_target_percentage: Option<u8>,
    pub carbon_intensity: Option<f64>,
}

/// Parse a status record with the field order
/// `percentage,remaining,charging,discharging,maintain_target[,carbon_intensity]`.
pub fn parse_status_csv(raw: &str) -> AppResult<BatteryStatusSnapshot> {
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    let record = lines
        .next()
        .ok_or_else(|| AppError::MalformedResponse("empty status record".to_string()))?;
    if lines.next().is_some() {
        return Err(AppError::MalformedResponse(format!(
            "expected one status record, got: {}",
            raw.trim()
        )));
    }

    let fields: Vec<&str> = record.split(',').map(str::trim).collect();
    if fields.len() < 5 || fields.len() > 6 {
        return Err(AppError::MalformedResponse(format!(
            "expected 5 or 6 fields, got {}: {}",
            fields.len(),
            record
        )));
    }

    let percentage = fields[0]
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| AppError::MalformedResponse(format!("bad percentage: {:?}", fields[0])))?;

    let time_remaining = if RE_REMAINING.is_match(fields[1]) {
        fields[1].to_string()
    } else {
        UNKNOWN_REMAINING.to_string()
    };

    let maintain_target_percentage = match fields[4] {
        "" => None,
        value => Some(
            value
                .parse::<u8>()
                .ok()
                .filter(|p| (1..=100).contains(p))
                .ok_or_else(|| AppError::MalformedResponse(format!("bad maintain target: {:?}", value)))?,
        ),
    };

    let carbon_intensity = match fields.get(5).copied() {
        None | Some("") => None,
        Some(value) => Some(
            value
                .parse::<f64>()
                .ok()
                .filter(|c| c.is_finite() && *c >= 0.0)
                .ok_or_else(|| AppError::MalformedResponse(format!("bad carbon intensity: {:?}", value)))?,
        ),
    };

    Ok(BatteryStatusSnapshot {
        percentage,
        time_remaining,
        is_charging: fields[2] == "enabled",
        is_discharge_forced: fields[3] == "discharging",
        maintain_target_percentage,
        carbon_intensity,
    })
}

impl BatteryStatusSnapshot {
    pub fn maintain_target_or(&self, default: u8) -> u8 {
        self.maintain_target_percentage.unwrap_or(default)
    }

    pub fn has_known_remaining(&self) -> bool {
        self.time_remaining != UNKNOWN_REMAINING
    }

    /// Battery line, e.g. `72% (0:45 remaining)`.
    pub fn battery_state(&self) -> String {
        if !self.has_known_remaining() && self.is_charging {
            format!("{}% (fully charged, power adapter attached)", self.percentage)
        } else {
            format!("{}% ({} remaining)", self.percentage, self.time_remaining)
        }
    }

    /// Daemon line, e.g. `forcing discharge to 80%`.
    pub fn daemon_state(&self, default_target: u8) -> String {
        if self.is_discharge_forced {
            format!("forcing discharge to {}%", self.maintain_target_or(default_target))
        } else {
            format!(
                "smc charging {}",
                if self.is_charging { "enabled" } else { "disabled" }
            )
        }
    }

    pub fn carbon_label(&self) -> Option<String> {
        self.carbon_intensity.map(|c| format!("{:.0} gCO2eq/kWh", c))
    }

    /// All display lines joined for a menu or terminal.
    pub fn summary(&self, default_target: u8) -> String {
        let mut lines = vec![self.battery_state(), self.daemon_state(default_target)];
        if let Some(carbon) = self.carbon_label() {
            lines.push(format!("grid carbon intensity {}", carbon));
        }
        lines.join("\n")
    }
}
