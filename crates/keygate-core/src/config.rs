//! Configuration types for keygate.
//!
//! Feature flags are the only installation-wide input the resolver reads.
//! They load from TOML:
//!
//! ```toml
//! [features]
//! per_object_moderation = true
//! threaded_replies = true
//! thread_replies_depth = 4
//! default_role = "spectator"
//!
//! [roles]
//! editor = "moderator"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use keygate_capability::{Role, RoleMap};

use crate::error::{ConfigError, ConfigResult};

/// Smallest allowed reply threading depth.
pub const MIN_THREAD_DEPTH: u8 = 1;

/// Largest allowed reply threading depth.
pub const MAX_THREAD_DEPTH: u8 = 10;

/// Installation-wide feature switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Allow moderators to be assigned to individual forums.
    ///
    /// When disabled, forum moderator lists are ignored entirely.
    pub per_object_moderation: bool,

    /// Allow replies to be threaded under other replies.
    pub threaded_replies: bool,

    /// Maximum reply threading depth.
    ///
    /// Defaults to 2.
    pub thread_replies_depth: u8,

    /// Give users from every site of a network a forum role.
    pub global_access: bool,

    /// Role given to users with no mapped role.
    pub default_role: Role,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            per_object_moderation: true,
            threaded_replies: false,
            thread_replies_depth: 2,
            global_access: true,
            default_role: Role::Participant,
        }
    }
}

impl FeatureFlags {
    /// Create feature flags with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable per-forum moderators.
    pub fn with_per_object_moderation(mut self, enabled: bool) -> Self {
        self.per_object_moderation = enabled;
        self
    }

    /// Enable or disable threaded replies.
    pub fn with_threaded_replies(mut self, enabled: bool) -> Self {
        self.threaded_replies = enabled;
        self
    }

    /// Set the reply threading depth, clamped to the allowed range.
    pub fn with_thread_replies_depth(mut self, depth: u8) -> Self {
        self.thread_replies_depth = depth.clamp(MIN_THREAD_DEPTH, MAX_THREAD_DEPTH);
        self
    }

    /// Enable or disable network-wide access.
    pub fn with_global_access(mut self, enabled: bool) -> Self {
        self.global_access = enabled;
        self
    }

    /// Set the default role.
    pub fn with_default_role(mut self, role: Role) -> Self {
        self.default_role = role;
        self
    }

    /// Flags that only trust global roles.
    ///
    /// Per-forum moderators are ignored and new users only spectate.
    pub fn strict() -> Self {
        Self {
            per_object_moderation: false,
            threaded_replies: false,
            thread_replies_depth: 2,
            global_access: false,
            default_role: Role::Spectator,
        }
    }

    /// Effective reply threading depth. Threading off means a flat list.
    pub fn effective_thread_depth(&self) -> u8 {
        if self.threaded_replies {
            self.thread_replies_depth
        } else {
            1
        }
    }

    fn normalize(mut self) -> Self {
        self.thread_replies_depth = self
            .thread_replies_depth
            .clamp(MIN_THREAD_DEPTH, MAX_THREAD_DEPTH);
        self
    }
}

/// Top-level keygate configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygateConfig {
    /// Feature switches.
    pub features: FeatureFlags,

    /// Site role → forum role overrides on top of the standard map.
    pub roles: BTreeMap<String, Role>,
}

impl KeygateConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let mut config: KeygateConfig = toml::from_str(content)?;
        config.features = config.features.normalize();
        Ok(config)
    }

    /// Set the feature flags.
    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Build the site role map from the default role and overrides.
    pub fn role_map(&self) -> RoleMap {
        self.roles.iter().fold(
            RoleMap::new(self.features.default_role),
            |map, (site_role, role)| map.with_mapping(site_role.clone(), *role),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_flag_defaults() {
        let flags = FeatureFlags::default();
        assert!(flags.per_object_moderation);
        assert!(!flags.threaded_replies);
        assert_eq!(flags.thread_replies_depth, 2);
        assert_eq!(flags.default_role, Role::Participant);
    }

    #[test]
    fn test_feature_flag_builder() {
        let flags = FeatureFlags::new()
            .with_per_object_moderation(false)
            .with_threaded_replies(true)
            .with_thread_replies_depth(50);

        assert!(!flags.per_object_moderation);
        assert_eq!(flags.thread_replies_depth, MAX_THREAD_DEPTH);
        assert_eq!(flags.effective_thread_depth(), MAX_THREAD_DEPTH);
    }

    #[test]
    fn test_flat_replies_depth() {
        let flags = FeatureFlags::new().with_thread_replies_depth(5);
        assert_eq!(flags.effective_thread_depth(), 1);
    }

    #[test]
    fn test_parse_config() {
        let config = KeygateConfig::parse(
            r#"
            [features]
            per_object_moderation = false
            thread_replies_depth = 0
            default_role = "spectator"

            [roles]
            editor = "moderator"
            "#,
        )
        .unwrap();

        assert!(!config.features.per_object_moderation);
        assert_eq!(config.features.thread_replies_depth, MIN_THREAD_DEPTH);
        // Unset fields keep their defaults.
        assert!(config.features.global_access);

        let map = config.role_map();
        assert_eq!(map.map(Some("editor")), Role::Moderator);
        assert_eq!(map.map(Some("author")), Role::Spectator);
        assert_eq!(map.map(Some("administrator")), Role::Keymaster);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = KeygateConfig::parse("").unwrap();
        assert_eq!(config, KeygateConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let result = KeygateConfig::parse("[features]\ndefault_role = \"admin\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = KeygateConfig::load("/nonexistent/keygate.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
