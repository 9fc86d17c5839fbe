//! Registry for looking up device profiles by model name.

use indexmap::IndexMap;

use super::definition::DeviceProfile;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Registry of device profiles, keyed case-insensitively by model.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    profiles: IndexMap<String, DeviceProfile>,
}

impl ModelRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            profiles: IndexMap::new(),
        }
    }

    /// Create a registry holding the built-in models.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_models();
        registry
    }

    fn register_builtin_models(&mut self) {
        for model in vendors::brocade::MODELS {
            self.profiles
                .insert(model.to_lowercase(), vendors::brocade::platform(model));
        }
    }

    /// Register a profile.
    pub fn register(&mut self, profile: DeviceProfile) -> Result<()> {
        let key = profile.name.to_lowercase();
        if self.profiles.contains_key(&key) {
            return Err(PlatformError::AlreadyRegistered { name: profile.name }.into());
        }
        self.profiles.insert(key, profile);
        Ok(())
    }

    /// Get a profile by model name.
    pub fn get(&self, name: &str) -> Option<&DeviceProfile> {
        self.profiles.get(&name.to_lowercase())
    }

    /// Get a profile by model name or fail with [`PlatformError::UnknownModel`].
    pub fn require(&self, name: &str) -> Result<&DeviceProfile> {
        self.get(name).ok_or_else(|| {
            PlatformError::UnknownModel {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Check if a model is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(&name.to_lowercase())
    }

    /// Registered model names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.values().map(|p| p.name.as_str())
    }
}
