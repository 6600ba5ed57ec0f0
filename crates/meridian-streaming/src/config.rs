use meridian_core::AssetClass;
use serde::{Deserialize, Serialize};

/// Timing for a single acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Give up once this much game time has elapsed since the first poll.
    pub timeout_budget_ms: u64,
    /// Minimum game time between two `is_loaded` checks.
    pub poll_interval_ms: u64,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            timeout_budget_ms: 10_000,
            poll_interval_ms: 10,
        }
    }
}

/// Per-class overrides of the timeout budget. `None` uses the loader default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassBudgets {
    pub model_ms: Option<u64>,
    pub anim_dict_ms: Option<u64>,
    pub anim_set_ms: Option<u64>,
    pub texture_dict_ms: Option<u64>,
    pub ptfx_asset_ms: Option<u64>,
}

impl ClassBudgets {
    pub fn get(&self, class: AssetClass) -> Option<u64> {
        match class {
            AssetClass::Model => self.model_ms,
            AssetClass::AnimDict => self.anim_dict_ms,
            AssetClass::AnimSet => self.anim_set_ms,
            AssetClass::TextureDict => self.texture_dict_ms,
            AssetClass::PtfxAsset => self.ptfx_asset_ms,
        }
    }
}

/// Streaming configuration. Maps to the `[streaming]` table of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub timeout_budget_ms: u64,
    pub poll_interval_ms: u64,
    pub budgets: ClassBudgets,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let defaults = AcquireOptions::default();
        Self {
            timeout_budget_ms: defaults.timeout_budget_ms,
            poll_interval_ms: defaults.poll_interval_ms,
            budgets: ClassBudgets::default(),
        }
    }
}

impl LoaderConfig {
    /// Acquire options for an asset class, with any per-class budget applied
    pub fn options_for(&self, class: AssetClass) -> AcquireOptions {
        AcquireOptions {
            timeout_budget_ms: self.budgets.get(class).unwrap_or(self.timeout_budget_ms),
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.timeout_budget_ms, 10_000);
        assert_eq!(config.poll_interval_ms, 10);
        assert_eq!(config.options_for(AssetClass::Model), AcquireOptions::default());
    }

    #[test]
    fn class_override() {
        let config = LoaderConfig {
            budgets: ClassBudgets {
                ptfx_asset_ms: Some(2_500),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.options_for(AssetClass::PtfxAsset).timeout_budget_ms, 2_500);
        assert_eq!(config.options_for(AssetClass::AnimDict).timeout_budget_ms, 10_000);
    }
}
