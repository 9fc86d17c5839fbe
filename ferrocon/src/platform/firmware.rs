//! Firmware descriptor: which image files belong to which model.
//!
//! The descriptor is a flat text file, one model per row:
//!
//! ```text
//! # model    boot            primary          poe (optional)
//! icx7150    mnz10114.bin    SPS08095.bin     icx7xxx_poe_02.1.0.b004.fw
//! icx7250    spz10114.bin    SPS08095.bin
//! ```
//!
//! Tokens are separated by whitespace. Blank rows and rows starting with
//! `#` are skipped. Model names compare case-insensitively and the first
//! matching row wins.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::definition::ImageKind;
use crate::error::{PlatformError, Result};

/// Parsed firmware descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmwareDescriptor {
    /// Tokens after the model name, keyed by lowercased model.
    rows: IndexMap<String, Vec<String>>,
}

impl FirmwareDescriptor {
    /// Parse descriptor text.
    pub fn parse(text: &str) -> Self {
        let mut rows = IndexMap::new();
        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            let Some(model) = tokens.next() else {
                continue;
            };
            if model.starts_with('#') {
                continue;
            }
            rows.entry(model.to_lowercase())
                .or_insert_with(|| tokens.map(str::to_string).collect());
        }
        Self { rows }
    }

    /// Read and parse a descriptor file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PlatformError::DescriptorRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Resolve the firmware files for `model`.
    ///
    /// A row with fewer than three tokens leaves boot and primary
    /// unresolved; a missing fourth token leaves PoE unresolved.
    pub fn lookup(&self, model: &str) -> Result<DeviceConfig> {
        let files = self
            .rows
            .get(&model.to_lowercase())
            .ok_or_else(|| PlatformError::ModelNotFound {
                model: model.to_string(),
            })?;

        let mut config = DeviceConfig::unresolved(model);
        if files.len() >= 2 {
            config.boot_file = Some(files[0].clone());
            config.primary_file = Some(files[1].clone());
            config.poe_file = files.get(2).cloned();
        }
        Ok(config)
    }

    /// Models present in the descriptor, lowercased, in file order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of model rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the descriptor has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Firmware filenames resolved for one model.
///
/// Built once when the switch is set up and never changed afterwards.
/// Any field may be unresolved; the upload sequence skips the steps that
/// need a missing file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Model name as requested.
    pub model: String,

    /// Boot ROM image file.
    pub boot_file: Option<String>,

    /// Primary flash image file.
    pub primary_file: Option<String>,

    /// PoE controller firmware file.
    pub poe_file: Option<String>,
}

impl DeviceConfig {
    /// A config with every file unresolved.
    pub fn unresolved(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Resolve `model` against `descriptor`, degrading to unresolved.
    ///
    /// A lookup failure is logged, not returned: provisioning carries on
    /// and skips whatever needs the missing files.
    pub fn resolve(model: &str, descriptor: &FirmwareDescriptor) -> Self {
        match descriptor.lookup(model) {
            Ok(config) => {
                debug!("firmware: resolved {:?}", config);
                config
            }
            Err(e) => {
                warn!("firmware: {}", e);
                Self::unresolved(model)
            }
        }
    }

    /// Read the descriptor at `path` and resolve `model`, degrading to
    /// unresolved if the file cannot be read.
    pub fn load(model: &str, path: impl AsRef<Path>) -> Self {
        match FirmwareDescriptor::from_path(path) {
            Ok(descriptor) => Self::resolve(model, &descriptor),
            Err(e) => {
                warn!("firmware: cannot find {} in descriptor: {}", model, e);
                Self::unresolved(model)
            }
        }
    }

    /// File for an upload slot.
    pub fn image(&self, image: ImageKind) -> Option<&str> {
        match image {
            ImageKind::Boot => self.boot_file.as_deref(),
            ImageKind::Primary => self.primary_file.as_deref(),
        }
    }

    /// PoE firmware file.
    pub fn poe(&self) -> Option<&str> {
        self.poe_file.as_deref()
    }

    /// Whether boot and primary images are both known.
    pub fn is_resolved(&self) -> bool {
        self.boot_file.is_some() && self.primary_file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const DESCRIPTOR: &str = "\
# model boot primary poe
icx7150  mnz10114.bin  SPS08095.bin  icx7xxx_poe.fw
ICX7250  spz10114.bin  SPS08095.bin

fcx      grz10100.bin
fws      fwz07400.bin  FWSR07400.bin  extra.fw  ignored
icx7150  other.bin     other.bin
";

    #[test]
    fn test_row_with_poe() {
        let descriptor = FirmwareDescriptor::parse(DESCRIPTOR);
        let config = descriptor.lookup("ICX7150").unwrap();
        assert_eq!(config.model, "ICX7150");
        assert_eq!(config.boot_file.as_deref(), Some("mnz10114.bin"));
        assert_eq!(config.primary_file.as_deref(), Some("SPS08095.bin"));
        assert_eq!(config.poe(), Some("icx7xxx_poe.fw"));
        assert!(config.is_resolved());
    }

    #[test]
    fn test_row_without_poe() {
        let descriptor = FirmwareDescriptor::parse(DESCRIPTOR);
        let config = descriptor.lookup("icx7250").unwrap();
        assert_eq!(config.image(ImageKind::Boot), Some("spz10114.bin"));
        assert_eq!(config.image(ImageKind::Primary), Some("SPS08095.bin"));
        assert_eq!(config.poe(), None);
    }

    #[test]
    fn test_short_row_leaves_files_unresolved() {
        let descriptor = FirmwareDescriptor::parse(DESCRIPTOR);
        let config = descriptor.lookup("FCX").unwrap();
        assert_eq!(config, DeviceConfig::unresolved("FCX"));
        assert!(!config.is_resolved());
    }

    #[test]
    fn test_extra_tokens_ignored() {
        let descriptor = FirmwareDescriptor::parse(DESCRIPTOR);
        let config = descriptor.lookup("fws").unwrap();
        assert_eq!(config.poe(), Some("extra.fw"));
    }

    #[test]
    fn test_first_row_wins() {
        let descriptor = FirmwareDescriptor::parse(DESCRIPTOR);
        assert_eq!(descriptor.len(), 4);
        let models: Vec<_> = descriptor.models().collect();
        assert_eq!(models, ["icx7150", "icx7250", "fcx", "fws"]);
    }

    #[test]
    fn test_missing_model() {
        let descriptor = FirmwareDescriptor::parse(DESCRIPTOR);
        let err = descriptor.lookup("ICX6450").unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::ModelNotFound { .. })
        ));

        let config = DeviceConfig::resolve("ICX6450", &descriptor);
        assert_eq!(config, DeviceConfig::unresolved("ICX6450"));
    }

    #[test]
    fn test_every_full_row_resolves() {
        let descriptor = FirmwareDescriptor::parse(DESCRIPTOR);
        let mut seen = std::collections::HashSet::new();
        for line in DESCRIPTOR.lines() {
            let tokens: Vec<_> = line.split_whitespace().collect();
            if tokens.len() < 3 || tokens[0].starts_with('#') {
                continue;
            }
            // Later duplicates are shadowed by the first row.
            if !seen.insert(tokens[0].to_lowercase()) {
                continue;
            }
            let config = descriptor.lookup(tokens[0]).unwrap();
            assert_eq!(config.boot_file.as_deref(), Some(tokens[1]));
            assert_eq!(config.primary_file.as_deref(), Some(tokens[2]));
            assert_eq!(config.poe_file.as_deref(), tokens.get(3).copied());
        }
    }

    #[test]
    fn test_load_missing_file_degrades() {
        let config = DeviceConfig::load("ICX7150", "/nonexistent/ferrocon/codes.txt");
        assert_eq!(config, DeviceConfig::unresolved("ICX7150"));

        let err = FirmwareDescriptor::from_path("/nonexistent/ferrocon/codes.txt").unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::DescriptorRead { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ferrocon-codes-{}.txt", std::process::id()));
        std::fs::write(&path, DESCRIPTOR).unwrap();

        let config = DeviceConfig::load("icx7150", &path);
        assert_eq!(config.boot_file.as_deref(), Some("mnz10114.bin"));

        std::fs::remove_file(&path).unwrap();
    }
}
