//! Recognized feature hooks

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A hook kind a registered function may fulfill.
///
/// The set is fixed by the engine; registering a function binds it to one
/// of these behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Vets a password before the engine accepts it
    PasswordCheck,

    /// Runs when a client session authenticates
    ClientAuth,
}

impl Feature {
    /// Every recognized feature
    pub const ALL: &'static [Feature] = &[Feature::PasswordCheck, Feature::ClientAuth];

    /// Stable lowercase name used in snapshots and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::PasswordCheck => "password_check",
            Feature::ClientAuth => "client_auth",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password_check" => Ok(Feature::PasswordCheck),
            "client_auth" => Ok(Feature::ClientAuth),
            other => Err(format!(
                "unrecognized feature '{other}' (expected one of: password_check, client_auth)"
            )),
        }
    }
}

#[cfg(test)]
mod hook_tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for feature in Feature::ALL {
            let parsed: Feature = feature.as_str().parse().unwrap();
            assert_eq!(parsed, *feature);
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "proc_check".parse::<Feature>().unwrap_err();
        assert!(err.contains("proc_check"));
    }
}
