use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::ParameterSet;

/// One-click strategy scenarios.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[serde(alias = "conservative")]
    Conservative,
    #[serde(alias = "testSuccess", alias = "test_success")]
    TestSuccess,
    #[serde(alias = "aggressiveScale", alias = "aggressive_scale")]
    AggressiveScale,
}

impl Preset {
    pub const ALL: [Preset; 3] = [
        Preset::Conservative,
        Preset::TestSuccess,
        Preset::AggressiveScale,
    ];

    pub const DEFAULT: Preset = Preset::TestSuccess;

    pub fn key(self) -> &'static str {
        match self {
            Preset::Conservative => "conservative",
            Preset::TestSuccess => "test-success",
            Preset::AggressiveScale => "aggressive-scale",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Conservative => "Conservative",
            Preset::TestSuccess => "Test Success",
            Preset::AggressiveScale => "Aggressive Scale",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::Conservative => "Low-risk, controlled growth",
            Preset::TestSuccess => "Validated market-fit scenario",
            Preset::AggressiveScale => "Maximum growth push",
        }
    }

    pub fn params(self) -> ParameterSet {
        match self {
            Preset::Conservative => ParameterSet {
                monthly_spend: 50_000.0,
                base_cpl: 10.0,
                conversion_rate: 30.0,
                cpl_penalty: 0.0,
                usage_days: 8,
                price_per_day: 5.0,
                retention: 75.0,
            },
            Preset::TestSuccess => ParameterSet::default(),
            Preset::AggressiveScale => ParameterSet {
                monthly_spend: 500_000.0,
                base_cpl: 12.0,
                conversion_rate: 35.0,
                cpl_penalty: 5.0,
                usage_days: 15,
                price_per_day: 5.0,
                retention: 90.0,
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "conservative" => Ok(Preset::Conservative),
            "test-success" | "testsuccess" => Ok(Preset::TestSuccess),
            "aggressive-scale" | "aggressivescale" => Ok(Preset::AggressiveScale),
            _ => Err(format!(
                "unknown preset '{s}', expected one of: conservative, test-success, aggressive-scale"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EconomicConstants, run_projection};

    #[test]
    fn every_preset_is_inside_the_slider_domain() {
        for preset in Preset::ALL {
            preset
                .params()
                .validate()
                .unwrap_or_else(|e| panic!("{preset} is invalid: {e}"));
        }
    }

    #[test]
    fn default_preset_matches_default_parameters() {
        assert_eq!(Preset::DEFAULT.params(), ParameterSet::default());
    }

    #[test]
    fn presets_parse_from_several_spellings() {
        assert_eq!("conservative".parse::<Preset>(), Ok(Preset::Conservative));
        assert_eq!("Test Success".parse::<Preset>(), Ok(Preset::TestSuccess));
        assert_eq!("testSuccess".parse::<Preset>(), Ok(Preset::TestSuccess));
        assert_eq!(
            "aggressive_scale".parse::<Preset>(),
            Ok(Preset::AggressiveScale)
        );
        let err = "moonshot".parse::<Preset>().expect_err("unknown preset");
        assert!(err.contains("moonshot"));
    }

    #[test]
    fn aggressive_scale_escalates_cpl_heavily() {
        let result = run_projection(
            &Preset::AggressiveScale.params(),
            &EconomicConstants::default(),
        )
        .expect("valid preset");
        // floor(500000 / 30000) = 16; 12 * (1 + 0.05 * 16) = 21.6
        assert_eq!(result.steps, 16);
        assert!((result.adjusted_cpl - 21.6).abs() < 1e-9);
        assert_eq!(result.kpis.all_in_payback.days(), Some(60));
    }
}
