//! Provisioning sequences for one switch.
//!
//! A [`Switch`] pairs a console [`Session`] with the model's
//! [`DeviceProfile`] and the firmware files resolved for it. The three
//! sequences are written once against the profile's command set:
//!
//! - **boot interrupt**: stop the boot countdown and boot from primary flash
//! - **wipe**: leave any stack, erase the startup config, reload
//! - **upload**: give the management port an address and pull images over
//!   TFTP, then optionally the PoE controller firmware
//!
//! None of them abort on unexpected output. Waits are unbounded unless the
//! session has a wait timeout, in which case a missing landmark surfaces
//! as [`ChannelError::Timeout`](crate::error::ChannelError::Timeout).

use std::fmt;

use log::{debug, info, trace, warn};
use serde::Serialize;

use super::report::{Transfer, UploadReport, WipeReport};
use super::session::Session;
use crate::channel::Landmark;
use crate::error::{ChannelError, DriverError, Result};
use crate::platform::{DeviceConfig, DeviceProfile, ImageKind};
use crate::transport::Transport;

/// States of the wipe sequence.
///
/// ```text
/// Booting ─► Enabled ─► Inspecting ─┬─► MemberDetected ─► Unconfiguring ─► Booting
///                                   └─► Primary ─► Erasing ─► Reloaded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeState {
    /// Interrupting the boot countdown.
    Booting,
    /// Entering privileged mode.
    Enabled,
    /// Reading the unit's identity line.
    Inspecting,
    /// The unit is a subordinate stack member.
    MemberDetected,
    /// Removing the unit from its stack and reloading.
    Unconfiguring,
    /// The unit is standalone or the stack's active unit.
    Primary,
    /// Erasing the startup configuration.
    Erasing,
    /// Reload issued on a clean configuration.
    Reloaded,
}

impl WipeState {
    /// Whether the sequence ends in this state.
    pub fn is_terminal(self) -> bool {
        self == WipeState::Reloaded
    }
}

impl fmt::Display for WipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WipeState::Booting => "booting",
            WipeState::Enabled => "enabled",
            WipeState::Inspecting => "inspecting",
            WipeState::MemberDetected => "member-detected",
            WipeState::Unconfiguring => "unconfiguring",
            WipeState::Primary => "primary",
            WipeState::Erasing => "erasing",
            WipeState::Reloaded => "reloaded",
        };
        f.write_str(name)
    }
}

/// A switch reached over its console.
#[derive(Debug)]
pub struct Switch {
    session: Session,
    profile: DeviceProfile,
    firmware: DeviceConfig,
    max_wipe_attempts: Option<u32>,
}

impl Switch {
    /// Create a switch from its parts. See
    /// [`SwitchBuilder`](super::SwitchBuilder) for the usual way in.
    pub fn new(session: Session, profile: DeviceProfile, firmware: DeviceConfig) -> Self {
        Self {
            session,
            profile,
            firmware,
            max_wipe_attempts: None,
        }
    }

    /// Limit the boot-interrupt passes a wipe may take. `None` retries
    /// until the unit stops reporting itself as a stack member.
    pub fn with_max_wipe_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_wipe_attempts = attempts;
        self
    }

    /// Open the serial port.
    pub fn connect(&mut self) -> Result<()> {
        self.session.connect()
    }

    /// Use an already-open transport instead of the serial port.
    pub fn attach(&mut self, transport: Transport) -> Result<()> {
        self.session.attach(transport)
    }

    /// Stop the workers and release the port.
    pub async fn close(&mut self) -> Result<()> {
        self.session.close().await
    }

    /// The console session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The console session, mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The device profile.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// The firmware files resolved for this switch.
    pub fn firmware(&self) -> &DeviceConfig {
        &self.firmware
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.profile.name
    }

    /// Issue a reload and answer its confirmation questions.
    pub fn reload(&self) -> Result<()> {
        let commands = &self.profile.commands;
        debug!("{}: reload", self.model());
        self.session
            .send_confirmed(&commands.reload, &commands.reload_confirmations)
    }

    /// Stop the boot countdown and boot from primary flash.
    ///
    /// Returns once the OS reports that initialization is done.
    pub async fn boot_interrupt(&self) -> Result<()> {
        let commands = &self.profile.commands;

        info!("{}: waiting for boot menu", self.model());
        let banner = self
            .session
            .wait_for(commands.boot_menu_banner.as_str())
            .await?;
        debug!("{}: boot menu: {}", self.model(), banner);

        self.session.send_raw(&commands.boot_interrupt_key)?;
        self.session.discard_pending()?;
        self.session.send(&commands.boot_no_password)?;
        self.session.send(&commands.boot_primary)?;

        self.session
            .wait_for(commands.init_complete_banner.as_str())
            .await?;
        info!("{}: initialization done", self.model());
        self.session.enter(1).await
    }

    /// Wipe the switch's configuration.
    ///
    /// A unit that reports itself as a stack member is unconfigured and
    /// reloaded, then the whole sequence starts again from the boot menu.
    pub async fn wipe(&self) -> Result<WipeReport> {
        let commands = &self.profile.commands;
        let mut report = WipeReport::default();
        let mut state = WipeState::Booting;

        loop {
            report.states.push(state);
            trace!("wipe: {}", state);

            state = match state {
                WipeState::Booting => {
                    if self
                        .max_wipe_attempts
                        .is_some_and(|max| report.iterations >= max)
                    {
                        return Err(DriverError::WipeNotConverged {
                            attempts: report.iterations,
                        }
                        .into());
                    }
                    report.iterations += 1;
                    info!("wipe: pass {} on {}", report.iterations, self.model());
                    self.boot_interrupt().await?;
                    WipeState::Enabled
                }
                WipeState::Enabled => {
                    self.session.discard_pending()?;
                    self.session.send(&commands.enable)?;
                    WipeState::Inspecting
                }
                WipeState::Inspecting => {
                    report.identity = self.read_identity().await?;
                    if report.identity.contains(commands.stack_member_marker.as_str()) {
                        WipeState::MemberDetected
                    } else {
                        WipeState::Primary
                    }
                }
                WipeState::MemberDetected => {
                    report.member_resets += 1;
                    info!("wipe: stack member ({}), unconfiguring", report.identity);
                    WipeState::Unconfiguring
                }
                WipeState::Unconfiguring => {
                    self.session.send(&commands.stack_unconfigure)?;
                    self.reload()?;
                    WipeState::Booting
                }
                WipeState::Primary => {
                    debug!("wipe: {} is not a stack member", self.model());
                    WipeState::Erasing
                }
                WipeState::Erasing => {
                    self.session.send(&commands.erase_startup)?;
                    self.reload()?;
                    WipeState::Reloaded
                }
                WipeState::Reloaded => break,
            };
        }

        info!("wipe: {} {}", self.model(), report);
        Ok(report)
    }

    /// Poll for the first line after `enable`.
    ///
    /// Bounded by the session's wait timeout when one is set.
    async fn read_identity(&self) -> Result<String> {
        match self.session.config().wait_timeout {
            Some(limit) => tokio::time::timeout(limit, self.poll_line())
                .await
                .map_err(|_| ChannelError::Timeout(limit))?,
            None => self.poll_line().await,
        }
    }

    async fn poll_line(&self) -> Result<String> {
        let poll_interval = self.session.config().poll_interval;
        loop {
            if let Some(line) = self.session.read_line()? {
                debug!("wipe: identity {}", line);
                return Ok(line);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Load firmware images from the TFTP server.
    ///
    /// Images without a resolved file are skipped with a warning. Models
    /// with the PoE step finish with [`install_poe_firmware`](Self::install_poe_firmware).
    pub async fn upload(&self) -> Result<UploadReport> {
        let commands = &self.profile.commands;
        let network = &self.profile.network;
        let mut report = UploadReport::default();

        self.boot_interrupt().await?;

        info!(
            "upload: {} management address {}",
            self.model(),
            network.switch_address
        );
        self.session.send(&commands.enable)?;
        self.session.send(&commands.configure)?;
        self.session.send(&commands.management_interface)?;
        self.session.send(&commands.address_command(network))?;
        self.session.send(&commands.interface_enable)?;
        self.session.send(&commands.end)?;

        for image in ImageKind::ORDER {
            let Some(file) = self.firmware.image(image) else {
                warn!(
                    "upload: no {} image resolved for {}, skipping",
                    image,
                    self.model()
                );
                report.skipped.push(image);
                continue;
            };

            info!("upload: {} image {}", image, file);
            let command = commands.transfer_command(network, image, file);
            let confirmation = self
                .session
                .send_and_expect(&command, commands.transfer_complete.as_str())
                .await?;
            report.transfers.push(Transfer {
                image,
                file: file.to_string(),
                confirmation,
            });
        }

        if self.profile.poe_install {
            report.poe_response = self.install_poe_firmware().await?;
        }

        info!("upload: {} {}", self.model(), report);
        Ok(report)
    }

    /// Install the PoE controller firmware.
    ///
    /// Returns `None` without touching the device when no PoE file was
    /// resolved. Otherwise returns the first line printed once the settle
    /// delay has passed; the echo and anything earlier is dropped.
    pub async fn install_poe_firmware(&self) -> Result<Option<String>> {
        let commands = &self.profile.commands;
        let Some(file) = self.firmware.poe() else {
            warn!("upload: no PoE firmware resolved for {}", self.model());
            return Ok(None);
        };

        info!("upload: PoE firmware {}", file);
        self.session
            .send(&commands.poe_install_command(&self.profile.network, file))?;
        tokio::time::sleep(commands.poe_settle).await;
        self.session.discard_pending()?;
        let line = self.session.wait_for(Landmark::contains("")).await?;
        debug!("upload: PoE install: {}", line);
        Ok(Some(line))
    }
}
