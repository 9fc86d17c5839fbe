//! Brocade / Ruckus FastIron switch profiles.
//!
//! Every FastIron model (ICX, FWS, FCX) speaks the same console dialogue:
//!
//! ```text
//! Hit 'b' to stop at boot monitor: 3      # boot menu countdown
//! ICX7150-Boot>> no password              # boot monitor
//! ICX7150-Boot>> boot system flash primary
//! ...
//! Initialization is done                  # OS ready
//! ICX7150-48P Router>enable
//! ICX7150-48P Router#                     # privileged
//! ICX7150-48P Router [MEMBER]#            # subordinate stack unit
//! ```
//!
//! Models differ only in their descriptor row; the ICX7150 additionally
//! installs PoE controller firmware after the images are written.

use std::time::Duration;

use crate::platform::{CommandSet, DeviceProfile};

/// ICX 7150, the only built-in model with the PoE firmware step.
pub const ICX7150: &str = "ICX7150";
/// ICX 7250.
pub const ICX7250: &str = "ICX7250";
/// ICX 6450.
pub const ICX6450: &str = "ICX6450";
/// ICX 7450.
pub const ICX7450: &str = "ICX7450";
/// FastIron workgroup switch (FWS).
pub const FWS: &str = "FWS";
/// FastIron FCX.
pub const FCX: &str = "FCX";

/// All built-in FastIron models.
pub const MODELS: [&str; 6] = [ICX7150, ICX7250, ICX6450, ICX7450, FWS, FCX];

/// FastIron console dialogue.
pub fn command_set() -> CommandSet {
    CommandSet {
        boot_menu_banner: "'b' to stop at".into(),
        boot_interrupt_key: "b".into(),
        boot_no_password: "no password".into(),
        boot_primary: "boot system flash primary".into(),
        init_complete_banner: "initialization is done".into(),
        enable: "enable".into(),
        stack_member_marker: "[MEMBER]".into(),
        stack_unconfigure: "stack unconfigure me".into(),
        erase_startup: "erase startup-config".into(),
        reload: "reload".into(),
        reload_confirmations: vec!["y".into(), "y".into()],
        configure: "configure terminal".into(),
        management_interface: "interface management 1".into(),
        ip_address: "ip address".into(),
        interface_enable: "enable".into(),
        end: "end".into(),
        copy_tftp_flash: "copy tftp flash".into(),
        boot_slot: "bootrom".into(),
        primary_slot: "primary".into(),
        transfer_complete: "TFTP to Flash Done".into(),
        poe_install: "inline power install-firmware all tftp".into(),
        poe_settle: Duration::from_millis(500),
    }
}

/// Profile for a FastIron model.
pub fn platform(model: &str) -> DeviceProfile {
    let profile = DeviceProfile::new(model, command_set());
    if model.eq_ignore_ascii_case(ICX7150) {
        profile.with_poe_install()
    } else {
        profile
    }
}
