//! Builder for creating switches.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

use super::session::Session;
use super::switch::Switch;
use crate::channel::ChannelConfig;
use crate::error::{DriverError, Result};
use crate::platform::{
    DeviceConfig, DeviceProfile, FirmwareDescriptor, ModelRegistry, ProvisioningNetwork,
};
use crate::transport::SerialConfig;

/// Where the firmware filenames come from.
#[derive(Debug, Clone)]
enum FirmwareSource {
    None,
    Path(PathBuf),
    Descriptor(FirmwareDescriptor),
    Resolved(DeviceConfig),
}

/// Builder for constructing a [`Switch`].
///
/// # Example
///
/// ```rust,no_run
/// use ferrocon::driver::SwitchBuilder;
///
/// # async fn example() -> Result<(), ferrocon::Error> {
/// let mut switch = SwitchBuilder::new("/dev/ttyUSB0")
///     .model("ICX7150")
///     .descriptor_path("/etc/ferrocon/codes.txt")
///     .build()?;
///
/// switch.connect()?;
/// switch.wipe().await?;
/// switch.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SwitchBuilder {
    serial: SerialConfig,
    channel: ChannelConfig,
    model: Option<String>,
    custom_profile: Option<DeviceProfile>,
    registry: Option<ModelRegistry>,
    network: Option<ProvisioningNetwork>,
    firmware: FirmwareSource,
    max_wipe_attempts: Option<u32>,
}

impl SwitchBuilder {
    /// Create a builder for the console on `port`.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            serial: SerialConfig::new(port, 9600),
            channel: ChannelConfig::default(),
            model: None,
            custom_profile: None,
            registry: None,
            network: None,
            firmware: FirmwareSource::None,
            max_wipe_attempts: None,
        }
    }

    /// Set the baud rate (default: 9600).
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.serial.baud_rate = baud_rate;
        self
    }

    /// Set the character framing (default: 8N1).
    pub fn framing(mut self, data_bits: DataBits, parity: Parity, stop_bits: StopBits) -> Self {
        self.serial.data_bits = data_bits;
        self.serial.parity = parity;
        self.serial.stop_bits = stop_bits;
        self
    }

    /// Set flow control (default: none).
    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.serial.flow_control = flow_control;
        self
    }

    /// Set the model name (e.g., "ICX7150", "fcx").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Use a custom profile instead of a registered model.
    pub fn profile(mut self, profile: DeviceProfile) -> Self {
        self.custom_profile = Some(profile);
        self
    }

    /// Look models up in `registry` instead of the built-in one.
    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the profile's provisioning addresses.
    pub fn network(mut self, network: ProvisioningNetwork) -> Self {
        self.network = Some(network);
        self
    }

    /// Read firmware filenames from the descriptor file at `path`.
    pub fn descriptor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.firmware = FirmwareSource::Path(path.into());
        self
    }

    /// Resolve firmware filenames from an already-parsed descriptor.
    pub fn descriptor(mut self, descriptor: FirmwareDescriptor) -> Self {
        self.firmware = FirmwareSource::Descriptor(descriptor);
        self
    }

    /// Use firmware filenames resolved elsewhere.
    pub fn firmware(mut self, firmware: DeviceConfig) -> Self {
        self.firmware = FirmwareSource::Resolved(firmware);
        self
    }

    /// Bound every wait. Without this, waits block until the landmark shows.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.channel.wait_timeout = Some(timeout);
        self
    }

    /// Replace the channel configuration.
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel = config;
        self
    }

    /// Give up a wipe after this many boot-interrupt passes.
    pub fn max_wipe_attempts(mut self, attempts: u32) -> Self {
        self.max_wipe_attempts = Some(attempts);
        self
    }

    /// Build the switch.
    ///
    /// This resolves the profile and firmware files but does not open the
    /// port. Call `connect()` on the returned switch.
    pub fn build(self) -> Result<Switch> {
        if self.serial.baud_rate == 0 {
            return Err(DriverError::InvalidConfig {
                message: "baud rate must be non-zero".to_string(),
            }
            .into());
        }

        let mut profile = if let Some(custom) = self.custom_profile {
            custom
        } else if let Some(name) = self.model {
            match &self.registry {
                Some(registry) => registry.require(&name)?.clone(),
                None => ModelRegistry::builtin().require(&name)?.clone(),
            }
        } else {
            return Err(DriverError::InvalidConfig {
                message: "model or profile must be specified".to_string(),
            }
            .into());
        };
        if let Some(network) = self.network {
            profile.network = network;
        }

        let key = profile.descriptor_key.as_str();
        let firmware = match self.firmware {
            FirmwareSource::None => {
                debug!("builder: no firmware descriptor for {}", profile.name);
                DeviceConfig::unresolved(key)
            }
            FirmwareSource::Path(path) => DeviceConfig::load(key, path),
            FirmwareSource::Descriptor(descriptor) => DeviceConfig::resolve(key, &descriptor),
            FirmwareSource::Resolved(firmware) => firmware,
        };

        let session = Session::new(self.serial, self.channel);
        Ok(Switch::new(session, profile, firmware).with_max_wipe_attempts(self.max_wipe_attempts))
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::error::{Error, PlatformError};
    use crate::platform::vendors::brocade;

    const DESCRIPTOR: &str = "icx7150 mnz10114.bin SPS08095.bin icx7xxx_poe.fw\n";

    #[test]
    fn test_build_from_model() {
        let switch = SwitchBuilder::new("/dev/ttyS1")
            .model("icx7150")
            .descriptor(FirmwareDescriptor::parse(DESCRIPTOR))
            .wait_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(switch.model(), "ICX7150");
        assert!(switch.profile().poe_install);
        assert_eq!(switch.firmware().poe(), Some("icx7xxx_poe.fw"));
        assert_eq!(switch.session().port_name(), "/dev/ttyS1");
        assert_eq!(
            switch.session().config().wait_timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_missing_model() {
        let err = SwitchBuilder::new("/dev/ttyS1").build().unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::InvalidConfig { .. })
        ));

        let err = SwitchBuilder::new("/dev/ttyS1")
            .model("catalyst")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_zero_baud_rate() {
        let err = SwitchBuilder::new("/dev/ttyS1")
            .model("fcx")
            .baud_rate(0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_unknown_descriptor_row_degrades() {
        let switch = SwitchBuilder::new("/dev/ttyS1")
            .model(brocade::FWS)
            .descriptor(FirmwareDescriptor::parse(DESCRIPTOR))
            .build()
            .unwrap();
        assert!(!switch.firmware().is_resolved());

        let switch = SwitchBuilder::new("/dev/ttyS1")
            .model(brocade::FWS)
            .descriptor_path("/nonexistent/ferrocon/codes.txt")
            .build()
            .unwrap();
        assert!(!switch.firmware().is_resolved());
    }

    #[test]
    fn test_custom_profile_and_registry() {
        let profile = brocade::platform("ICX7650").with_descriptor_key("icx7150");
        let switch = SwitchBuilder::new("/dev/ttyS1")
            .profile(profile.clone())
            .descriptor(FirmwareDescriptor::parse(DESCRIPTOR))
            .network(ProvisioningNetwork {
                switch_address: Ipv4Addr::new(10, 0, 0, 5),
                netmask: Ipv4Addr::new(255, 255, 255, 0),
                tftp_server: Ipv4Addr::new(10, 0, 0, 1),
            })
            .max_wipe_attempts(3)
            .build()
            .unwrap();
        assert_eq!(switch.model(), "ICX7650");
        assert_eq!(switch.firmware().boot_file.as_deref(), Some("mnz10114.bin"));
        assert_eq!(
            switch.profile().network.tftp_server,
            Ipv4Addr::new(10, 0, 0, 1)
        );

        let mut registry = ModelRegistry::new();
        registry.register(profile).unwrap();
        let switch = SwitchBuilder::new("/dev/ttyS1")
            .registry(registry)
            .model("icx7650")
            .build()
            .unwrap();
        assert_eq!(switch.profile().descriptor_key, "icx7150");
    }
}
