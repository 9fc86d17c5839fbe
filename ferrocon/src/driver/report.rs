//! Outcome records for the provisioning sequences.

use std::fmt;

use serde::Serialize;

use super::switch::WipeState;
use crate::platform::ImageKind;

/// Result of a wipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WipeReport {
    /// Boot-interrupt passes, counting the final one.
    pub iterations: u32,

    /// Times the unit identified as a stack member and was unconfigured.
    pub member_resets: u32,

    /// Identity line read on the final pass.
    pub identity: String,

    /// Every state entered, in order.
    pub states: Vec<WipeState>,
}

impl WipeReport {
    /// Whether the unit had to leave a stack before it could be wiped.
    pub fn was_stack_member(&self) -> bool {
        self.member_resets > 0
    }
}

impl fmt::Display for WipeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wiped after {} pass(es), {} stack reset(s)",
            self.iterations, self.member_resets
        )
    }
}

/// One image written to flash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    /// Flash slot.
    pub image: ImageKind,

    /// File fetched from the TFTP server.
    pub file: String,

    /// Line confirming the write.
    pub confirmation: String,
}

/// Result of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    /// Images written, in upload order.
    pub transfers: Vec<Transfer>,

    /// Images skipped because no file was resolved.
    pub skipped: Vec<ImageKind>,

    /// First line the device printed after the PoE install command, if it
    /// was issued.
    pub poe_response: Option<String>,
}

impl UploadReport {
    /// Whether every image was written.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Whether the PoE firmware install command was issued.
    pub fn poe_installed(&self) -> bool {
        self.poe_response.is_some()
    }

    /// Files written, in upload order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.transfers.iter().map(|t| t.file.as_str())
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} image(s) written", self.transfers.len())?;
        if !self.skipped.is_empty() {
            let skipped: Vec<_> = self.skipped.iter().map(ToString::to_string).collect();
            write!(f, ", skipped {}", skipped.join(", "))?;
        }
        if self.poe_installed() {
            f.write_str(", PoE firmware installed")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_report_display() {
        let report = UploadReport {
            transfers: vec![Transfer {
                image: ImageKind::Primary,
                file: "SPS08095.bin".into(),
                confirmation: "TFTP to Flash Done.".into(),
            }],
            skipped: vec![ImageKind::Boot],
            poe_response: Some("PoE firmware download started".into()),
        };
        assert!(!report.is_complete());
        assert!(report.poe_installed());
        assert_eq!(report.files().collect::<Vec<_>>(), ["SPS08095.bin"]);
        assert_eq!(
            report.to_string(),
            "1 image(s) written, skipped boot, PoE firmware installed"
        );
    }

    #[test]
    fn test_wipe_report_serializes_states() {
        let report = WipeReport {
            iterations: 1,
            member_resets: 0,
            identity: "ready".into(),
            states: vec![WipeState::Booting, WipeState::Reloaded],
        };
        assert!(!report.was_stack_member());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["states"], serde_json::json!(["booting", "reloaded"]));
    }
}
