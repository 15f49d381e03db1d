// Simulator session domain model
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Parameters handed to the simulator backend on start.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub base_speed: f64,
    pub speed_variation: f64,
    /// Seconds between published samples.
    pub change_interval: f64,
    pub acceleration_factor: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            base_speed: 30.0,
            speed_variation: 20.0,
            change_interval: 1.0,
            acceleration_factor: 0.2,
        }
    }
}

impl SimulatorConfig {
    pub fn get(&self, field: ConfigField) -> f64 {
        match field {
            ConfigField::BaseSpeed => self.base_speed,
            ConfigField::SpeedVariation => self.speed_variation,
            ConfigField::ChangeInterval => self.change_interval,
            ConfigField::AccelerationFactor => self.acceleration_factor,
        }
    }

    /// Replaces exactly one field.
    pub fn set(&mut self, field: ConfigField, value: f64) {
        match field {
            ConfigField::BaseSpeed => self.base_speed = value,
            ConfigField::SpeedVariation => self.speed_variation = value,
            ConfigField::ChangeInterval => self.change_interval = value,
            ConfigField::AccelerationFactor => self.acceleration_factor = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    BaseSpeed,
    SpeedVariation,
    ChangeInterval,
    AccelerationFactor,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::BaseSpeed,
        ConfigField::SpeedVariation,
        ConfigField::ChangeInterval,
        ConfigField::AccelerationFactor,
    ];

    /// Name used on the wire and in console commands.
    pub fn wire_name(self) -> &'static str {
        match self {
            ConfigField::BaseSpeed => "baseSpeed",
            ConfigField::SpeedVariation => "speedVariation",
            ConfigField::ChangeInterval => "changeInterval",
            ConfigField::AccelerationFactor => "accelerationFactor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfigField::BaseSpeed => "Base Speed (km/h)",
            ConfigField::SpeedVariation => "Speed Variation (km/h)",
            ConfigField::ChangeInterval => "Change Interval (s)",
            ConfigField::AccelerationFactor => "Acceleration Factor",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown simulator field '{0}' (expected one of baseSpeed, speedVariation, changeInterval, accelerationFactor)")]
pub struct UnknownField(pub String);

impl FromStr for ConfigField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accepts baseSpeed, base_speed and base-speed alike
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "basespeed" => Ok(ConfigField::BaseSpeed),
            "speedvariation" => Ok(ConfigField::SpeedVariation),
            "changeinterval" => Ok(ConfigField::ChangeInterval),
            "accelerationfactor" => Ok(ConfigField::AccelerationFactor),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Stopped,
    Running,
}

impl fmt::Display for SimulatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorState::Stopped => f.write_str("stopped"),
            SimulatorState::Running => f.write_str("running"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_parse_in_any_style() {
        assert_eq!("baseSpeed".parse::<ConfigField>(), Ok(ConfigField::BaseSpeed));
        assert_eq!("base_speed".parse::<ConfigField>(), Ok(ConfigField::BaseSpeed));
        assert_eq!("Change-Interval".parse::<ConfigField>(), Ok(ConfigField::ChangeInterval));
        assert_eq!(
            "ACCELERATIONFACTOR".parse::<ConfigField>(),
            Ok(ConfigField::AccelerationFactor)
        );
        assert!("topSpeed".parse::<ConfigField>().is_err());
    }

    #[test]
    fn test_set_replaces_single_field() {
        let mut config = SimulatorConfig::default();
        config.set(ConfigField::SpeedVariation, 5.0);

        assert_eq!(config.speed_variation, 5.0);
        assert_eq!(config.base_speed, 30.0);
        assert_eq!(config.change_interval, 1.0);
        assert_eq!(config.acceleration_factor, 0.2);
        assert_eq!(config.get(ConfigField::SpeedVariation), 5.0);
    }
}
