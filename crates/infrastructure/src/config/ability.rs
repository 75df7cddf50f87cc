//! Ability (authorization) configuration.

use std::collections::HashMap;

use application::CapabilityRule;
use serde::{Deserialize, Serialize};

/// Role policies and ability cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityAppConfig {
    /// How long a resolved ability stays cached
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached actor abilities
    #[serde(default = "default_max_cached_actors")]
    pub max_cached_actors: u64,

    /// Capability rules granted by each role, in evaluation order
    #[serde(default)]
    pub roles: HashMap<String, Vec<CapabilityRule>>,
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

const fn default_max_cached_actors() -> u64 {
    10_000
}

impl Default for AbilityAppConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            max_cached_actors: default_max_cached_actors(),
            roles: HashMap::new(),
        }
    }
}
