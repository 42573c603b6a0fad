//! The interface to the ADS client library used for a check.
//!
//! The checker never talks to the network itself.  Everything goes through a
//! `ClientLibrary`, which provides a presence check, connection construction
//! and, via the returned `Connection`, the state queries.  `tcp::AdsTcpLibrary`
//! implements this on top of the `ads` crate.

use std::fmt::{self, Display};

use ads::client::AdsState;
use ads::AmsNetId;
use itertools::Itertools;

use crate::Config;

/// Identity of an ADS device, as returned by its device info.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: String,
    pub major: u8,
    pub minor: u8,
    pub build: u16,
}

impl Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} v{}.{}.{}", self.name, self.major, self.minor, self.build)
    }
}

/// What a successful state query found out about the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceState {
    pub ads_state: AdsState,
    pub device_state: u16,
    /// Not all services answer the device info request.
    pub identity: Option<DeviceIdentity>,
}

impl DeviceState {
    pub fn is_running(&self) -> bool {
        self.ads_state == AdsState::Run
    }
}

impl Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ADS state {:?}, device state {}", self.ads_state, self.device_state)?;
        if let Some(identity) = &self.identity {
            write!(f, ", device {}", identity)?;
        }
        Ok(())
    }
}

/// System information a device reports about itself over UDP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteSystem {
    pub net_id: AmsNetId,
    pub hostname: String,
    pub twincat_version: (u8, u8, u16),
}

impl Display for RemoteSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (major, minor, build) = self.twincat_version;
        write!(f, "{} on {} (TwinCAT {})", self.net_id, self.hostname,
               [major as u16, minor as u16, build].iter().format("."))
    }
}

/// An open connection to one ADS device.
///
/// Closing consumes the connection; `session::Session` makes sure this happens
/// exactly once.
pub trait Connection: Sized {
    /// Read the device's name and version.
    fn device_info(&self) -> ads::Result<DeviceIdentity>;

    /// Read the ADS and device state.
    fn state(&self) -> ads::Result<(AdsState, u16)>;

    /// Release the underlying socket.
    fn close(self);
}

/// The capabilities of an ADS client library that a check needs.
pub trait ClientLibrary {
    type Connection: Connection;

    /// Name of the library, for messages.
    fn name(&self) -> &str;

    /// Return the library version if it is available.
    fn installed_version(&self) -> Option<String>;

    /// Try to make the library available.
    fn install(&self) -> Result<(), String> {
        Err(format!("{} cannot be installed automatically", self.name()))
    }

    /// Instructions for installing the library by hand.
    fn install_instructions(&self) -> String;

    /// Connect to the device given by the configuration.
    fn connect(&self, config: &Config) -> ads::Result<Self::Connection>;

    /// Ask the device at the configured IP address for its system info.
    fn identify(&self, config: &Config) -> ads::Result<RemoteSystem>;
}
