//! Contains the configuration of a connection check.

use std::fmt::{self, Display};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use ads::{AmsAddr, AmsNetId, AmsPort};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ConfigError;

/// NetID of the PLC checked when nothing else is given.
pub const NET_ID: &str = "192.168.165.1.1.1";
/// IP address of the PLC checked when nothing else is given.
pub const PLC_IP: &str = "192.168.16.229";
/// AMS port of the first PLC runtime on TwinCAT 2.
pub const AMS_PORT: AmsPort = 801;
/// TCP port of the AMS router.
pub const TCP_PORT: u16 = 0xBF02;
/// UDP port of the ADS discovery service.
pub const UDP_PORT: u16 = 0xBF03;
/// Connect, read and write timeout.
pub const TIMEOUT: Duration = Duration::from_secs(10);

// Six decimal octets; the range is checked when parsing the bytes.
static NETID_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}(\.\d{1,3}){5}$").expect("valid regex")
});

/// Parse a NetID, requiring all six parts to be present.
///
/// `AmsNetId::from_str` fills in missing trailing bytes with 1, which would
/// hide a mistyped identifier, so the format is checked first.
pub fn parse_net_id(s: &str) -> Result<AmsNetId, ConfigError> {
    if !NETID_FORMAT.is_match(s) {
        return Err(ConfigError::InvalidNetId(s.into()));
    }
    s.parse().map_err(|_| ConfigError::InvalidNetId(s.into()))
}

/// Everything a single check needs to know about its target.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// AMS NetID of the target.
    pub net_id: AmsNetId,
    /// IP address of the target.
    pub ip: Ipv4Addr,
    /// AMS port of the ADS service to query.
    pub ams_port: AmsPort,
    /// TCP port of the AMS router.
    pub tcp_port: u16,
    /// UDP port used for NetID discovery.
    pub udp_port: u16,
    /// Timeout for connecting and for each request.
    pub timeout: Duration,
    /// Treat any ADS state other than `Run` as a failed query.
    pub require_run: bool,
    /// Allow installing the client library if it is missing.
    pub allow_install: bool,
    /// Ask the device for its NetID after a failed check.
    pub discover: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            net_id: AmsNetId::new(192, 168, 165, 1, 1, 1),
            ip: Ipv4Addr::new(192, 168, 16, 229),
            ams_port: AMS_PORT,
            tcp_port: TCP_PORT,
            udp_port: UDP_PORT,
            timeout: TIMEOUT,
            require_run: true,
            allow_install: false,
            discover: false,
        }
    }
}

impl Config {
    /// Create a configuration from the three target values as strings/numbers,
    /// keeping the defaults for everything else.
    pub fn from_parts(net_id: &str, ip: &str, ams_port: AmsPort) -> Result<Self, ConfigError> {
        let net_id = parse_net_id(net_id)?;
        let ip = ip.parse().map_err(|_| ConfigError::InvalidAddress(ip.into()))?;
        let config = Self { net_id, ip, ams_port, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    /// Check the values that can't be caught by their types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ams_port == 0 {
            return Err(ConfigError::InvalidPort(self.ams_port));
        }
        if self.tcp_port == 0 {
            return Err(ConfigError::InvalidTcpPort(self.tcp_port));
        }
        // A zero timeout is rejected by the socket calls, which would look
        // like an unreachable device.
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(self.timeout));
        }
        Ok(())
    }

    /// The TCP endpoint of the AMS router.
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, self.tcp_port)
    }

    /// The AMS address of the ADS service.
    pub fn ams_addr(&self) -> AmsAddr {
        AmsAddr::new(self.net_id, self.ams_port)
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} via {}", self.ams_addr(), self.socket_addr())
    }
}
