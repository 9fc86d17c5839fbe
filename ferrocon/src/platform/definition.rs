//! Device profile: everything model-specific about a provisioning run.
//!
//! Models of one switch family share the same console dialogue and differ
//! only in data: which descriptor row they bind and whether they need the
//! PoE firmware step. A profile captures that data; the sequences in
//! [`crate::driver::Switch`] are written once against it.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Firmware image slots written during upload, in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Boot ROM image.
    Boot,
    /// Primary flash image.
    Primary,
}

impl ImageKind {
    /// Upload order.
    pub const ORDER: [ImageKind; 2] = [ImageKind::Boot, ImageKind::Primary];
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::Boot => f.write_str("boot"),
            ImageKind::Primary => f.write_str("primary"),
        }
    }
}

/// Addresses used while provisioning over the management port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningNetwork {
    /// Address assigned to the switch's management interface.
    pub switch_address: Ipv4Addr,

    /// Netmask for the management interface.
    pub netmask: Ipv4Addr,

    /// TFTP server holding the firmware images.
    pub tftp_server: Ipv4Addr,
}

impl Default for ProvisioningNetwork {
    fn default() -> Self {
        Self {
            switch_address: Ipv4Addr::new(192, 168, 1, 1),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            tftp_server: Ipv4Addr::new(192, 168, 1, 2),
        }
    }
}

/// Console commands and output landmarks for a switch family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSet {
    /// Banner shown while the boot menu countdown runs.
    pub boot_menu_banner: String,

    /// Keystroke that stops the countdown (sent without terminator).
    pub boot_interrupt_key: String,

    /// Disables the boot monitor password prompt.
    pub boot_no_password: String,

    /// Boots from the primary flash image.
    pub boot_primary: String,

    /// Printed once the OS has finished booting.
    pub init_complete_banner: String,

    /// Enters privileged mode.
    pub enable: String,

    /// Marker in the identity line of a subordinate stack unit.
    pub stack_member_marker: String,

    /// Removes the unit from its stack.
    pub stack_unconfigure: String,

    /// Erases the startup configuration.
    pub erase_startup: String,

    /// Reloads the switch.
    pub reload: String,

    /// Bare keystrokes answering the reload questions.
    pub reload_confirmations: Vec<String>,

    /// Enters configuration mode.
    pub configure: String,

    /// Selects the management interface.
    pub management_interface: String,

    /// Address command prefix; followed by address and netmask.
    pub ip_address: String,

    /// Enables the selected interface.
    pub interface_enable: String,

    /// Leaves configuration mode.
    pub end: String,

    /// Transfer command prefix; followed by server, file and slot.
    pub copy_tftp_flash: String,

    /// Flash slot name for the boot image.
    pub boot_slot: String,

    /// Flash slot name for the primary image.
    pub primary_slot: String,

    /// Printed when a transfer has been written to flash.
    pub transfer_complete: String,

    /// PoE firmware install prefix; followed by server and file.
    pub poe_install: String,

    /// Pause after the PoE install command before watching output.
    pub poe_settle: Duration,
}

impl CommandSet {
    /// Address assignment line for the management interface.
    pub fn address_command(&self, network: &ProvisioningNetwork) -> String {
        format!(
            "{} {} {}",
            self.ip_address, network.switch_address, network.netmask
        )
    }

    /// Transfer command writing `file` into the slot for `image`.
    pub fn transfer_command(
        &self,
        network: &ProvisioningNetwork,
        image: ImageKind,
        file: &str,
    ) -> String {
        let slot = match image {
            ImageKind::Boot => &self.boot_slot,
            ImageKind::Primary => &self.primary_slot,
        };
        format!(
            "{} {} {} {}",
            self.copy_tftp_flash, network.tftp_server, file, slot
        )
    }

    /// PoE firmware install command for `file`.
    pub fn poe_install_command(&self, network: &ProvisioningNetwork, file: &str) -> String {
        format!("{} {} {}", self.poe_install, network.tftp_server, file)
    }
}

/// Capability record for one switch model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Model name (e.g. "ICX7150").
    pub name: String,

    /// Row key in the firmware descriptor. Matched case-insensitively.
    pub descriptor_key: String,

    /// Console dialogue for this model.
    pub commands: CommandSet,

    /// Whether upload ends with the PoE firmware install step.
    pub poe_install: bool,

    /// Provisioning addresses.
    pub network: ProvisioningNetwork,
}

impl DeviceProfile {
    /// Create a profile whose descriptor key is its name.
    pub fn new(name: impl Into<String>, commands: CommandSet) -> Self {
        let name = name.into();
        Self {
            descriptor_key: name.clone(),
            name,
            commands,
            poe_install: false,
            network: ProvisioningNetwork::default(),
        }
    }

    /// Bind a different descriptor row.
    pub fn with_descriptor_key(mut self, key: impl Into<String>) -> Self {
        self.descriptor_key = key.into();
        self
    }

    /// Enable the PoE firmware install step.
    pub fn with_poe_install(mut self) -> Self {
        self.poe_install = true;
        self
    }

    /// Set the provisioning addresses.
    pub fn with_network(mut self, network: ProvisioningNetwork) -> Self {
        self.network = network;
        self
    }
}
