use std::str::FromStr;

use crate::error::ConfigError;

/// Physical and fleet limits shared by every zip launched from the depot
#[derive(Clone, Debug, PartialEq)]
pub struct FleetConfig {
    /// Number of zips at the depot
    pub num_zips: usize,
    /// A zip can carry between 1 and this many packages per flight.
    /// It may deliver more than one package per stop.
    pub max_packages_per_zip: usize,
    /// Constant ground speed of every zip in meters per second
    pub zip_speed_mps: f64,
    /// Farthest total round-trip distance a zip can fly in meters
    pub zip_max_cumulative_range_m: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            num_zips: 10,
            max_packages_per_zip: 3,
            zip_speed_mps: 30.0,
            zip_max_cumulative_range_m: 160.0 * 1000.0,
        }
    }
}

impl FleetConfig {
    pub const NUM_ZIPS_VAR: &'static str = "ZIP_NUM_ZIPS";
    pub const MAX_PACKAGES_VAR: &'static str = "ZIP_MAX_PACKAGES";
    pub const SPEED_VAR: &'static str = "ZIP_SPEED_MPS";
    pub const RANGE_VAR: &'static str = "ZIP_MAX_RANGE_M";

    /// Defaults overridden by any `ZIP_*` variables set in the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `ZIP_*` variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            num_zips: parse_var(&lookup, Self::NUM_ZIPS_VAR, defaults.num_zips)?,
            max_packages_per_zip: parse_var(
                &lookup,
                Self::MAX_PACKAGES_VAR,
                defaults.max_packages_per_zip,
            )?,
            zip_speed_mps: parse_var(&lookup, Self::SPEED_VAR, defaults.zip_speed_mps)?,
            zip_max_cumulative_range_m: parse_var(
                &lookup,
                Self::RANGE_VAR,
                defaults.zip_max_cumulative_range_m,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects a fleet that could never launch anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_zips == 0 {
            return Err(ConfigError::NoZips);
        }
        if self.max_packages_per_zip == 0 {
            return Err(ConfigError::NoCapacity);
        }
        if !(self.zip_speed_mps.is_finite() && self.zip_speed_mps > 0.0) {
            return Err(ConfigError::InvalidSpeed(self.zip_speed_mps));
        }
        if !(self.zip_max_cumulative_range_m.is_finite() && self.zip_max_cumulative_range_m > 0.0)
        {
            return Err(ConfigError::InvalidRange(self.zip_max_cumulative_range_m));
        }

        Ok(())
    }

    /// Most packages the whole fleet can carry in a single tick
    pub fn fleet_capacity(&self) -> usize {
        self.num_zips * self.max_packages_per_zip
    }
}

fn parse_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: var.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = FleetConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.fleet_capacity(), 30);
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = FleetConfig::from_lookup(lookup(&[
            ("ZIP_NUM_ZIPS", "4"),
            ("ZIP_SPEED_MPS", " 25.5 "),
        ]))
        .expect("config");

        assert_eq!(config.num_zips, 4);
        assert_eq!(config.zip_speed_mps, 25.5);
        assert_eq!(config.max_packages_per_zip, 3);
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let err = FleetConfig::from_lookup(lookup(&[("ZIP_MAX_PACKAGES", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                var: "ZIP_MAX_PACKAGES".to_string(),
                value: "lots".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_limits() {
        let zero_zips = FleetConfig {
            num_zips: 0,
            ..Default::default()
        };
        let zero_capacity = FleetConfig {
            max_packages_per_zip: 0,
            ..Default::default()
        };
        let stalled = FleetConfig {
            zip_speed_mps: 0.0,
            ..Default::default()
        };
        let grounded = FleetConfig {
            zip_max_cumulative_range_m: -1.0,
            ..Default::default()
        };

        assert_eq!(zero_zips.validate(), Err(ConfigError::NoZips));
        assert_eq!(zero_capacity.validate(), Err(ConfigError::NoCapacity));
        assert_eq!(stalled.validate(), Err(ConfigError::InvalidSpeed(0.0)));
        assert_eq!(grounded.validate(), Err(ConfigError::InvalidRange(-1.0)));
    }

    #[test]
    fn test_lookup_validates_result() {
        let err = FleetConfig::from_lookup(lookup(&[("ZIP_NUM_ZIPS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::NoZips);
    }
}
