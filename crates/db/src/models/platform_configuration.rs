use gigsync_core::config_shape;
use gigsync_core::types::{ConfigBlob, OrgId, PlatformId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `platform_configurations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfiguration {
    pub organization_id: OrgId,
    pub platform_id: PlatformId,
    pub enabled: bool,
    #[serde(default)]
    pub config: ConfigBlob,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PlatformConfiguration {
    /// A fresh, disabled, empty configuration.
    pub fn new(organization_id: OrgId, platform_id: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            organization_id,
            platform_id: platform_id.to_string(),
            enabled: false,
            config: ConfigBlob::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether any credential / endpoint value has been filled in.
    pub fn is_configured(&self) -> bool {
        !config_shape::is_blank(&self.config)
    }
}

/// Partial update for a configuration.
///
/// `config` keys are merged into the stored blob; a `null` value removes
/// the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub enabled: Option<bool>,
    pub config: Option<ConfigBlob>,
}

/// How a platform looks from an organization's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigReadiness {
    /// No configuration row exists.
    NotConfigured,
    /// Saved but switched off.
    Disabled,
    /// Switched on with nothing filled in yet ("enable now, configure later").
    EnabledUnconfigured,
    /// Switched on with a non-empty config.
    Ready,
}

impl ConfigReadiness {
    pub fn of(configuration: Option<&PlatformConfiguration>) -> Self {
        match configuration {
            None => Self::NotConfigured,
            Some(c) if !c.enabled => Self::Disabled,
            Some(c) if !c.is_configured() => Self::EnabledUnconfigured,
            Some(_) => Self::Ready,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn readiness_distinguishes_all_four_states() {
        let org = Uuid::now_v7();
        assert_eq!(ConfigReadiness::of(None), ConfigReadiness::NotConfigured);

        let mut config = PlatformConfiguration::new(org, "amove");
        assert_eq!(ConfigReadiness::of(Some(&config)), ConfigReadiness::Disabled);

        config.enabled = true;
        assert_eq!(
            ConfigReadiness::of(Some(&config)),
            ConfigReadiness::EnabledUnconfigured
        );

        config.config.insert("api_key".into(), json!("k"));
        assert_eq!(ConfigReadiness::of(Some(&config)), ConfigReadiness::Ready);

        config.enabled = false;
        assert_eq!(ConfigReadiness::of(Some(&config)), ConfigReadiness::Disabled);
    }
}
