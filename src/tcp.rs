//! The production client library: ADS over TCP, provided by the `ads` crate.

use ads::client::{AdsState, Client, Source, Timeouts};
use ads::AmsAddr;

use crate::library::{ClientLibrary, Connection, DeviceIdentity, RemoteSystem};
use crate::Config;

/// Version requirement of the `ads` crate this binary is built against.
pub const ADS_CRATE_VERSION: &str = "0.4";

/// `ClientLibrary` backed by the `ads` crate.
///
/// The crate is linked into the binary, so it is always available.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdsTcpLibrary;

impl ClientLibrary for AdsTcpLibrary {
    type Connection = TcpConnection;

    fn name(&self) -> &str {
        "ads"
    }

    fn installed_version(&self) -> Option<String> {
        Some(ADS_CRATE_VERSION.into())
    }

    fn install_instructions(&self) -> String {
        format!("Add `ads = \"{}\"` to the [dependencies] of Cargo.toml and rebuild \
                 with `cargo install --path .`", ADS_CRATE_VERSION)
    }

    fn connect(&self, config: &Config) -> ads::Result<TcpConnection> {
        // The source NetID is the local IP with .1.1 appended; the PLC needs
        // a route for exactly that NetID.
        let client = Client::new(config.socket_addr(), Timeouts::new(config.timeout), Source::Auto)?;
        log::debug!("connected to {}, source address {}", config.socket_addr(), client.source());
        Ok(TcpConnection { client, target: config.ams_addr() })
    }

    fn identify(&self, config: &Config) -> ads::Result<RemoteSystem> {
        let ip = config.ip.to_string();
        let info = ads::udp::get_info((ip.as_str(), config.udp_port))?;
        Ok(RemoteSystem {
            net_id: info.netid,
            hostname: info.hostname,
            twincat_version: info.twincat_version,
        })
    }
}

/// An `ads::Client` together with the device to query.
pub struct TcpConnection {
    client: Client,
    target: AmsAddr,
}

impl TcpConnection {
    /// The AMS address requests are sent from.
    pub fn source(&self) -> AmsAddr {
        self.client.source()
    }
}

impl Connection for TcpConnection {
    fn device_info(&self) -> ads::Result<DeviceIdentity> {
        let info = self.client.device(self.target).get_info()?;
        Ok(DeviceIdentity {
            name: info.name,
            major: info.major,
            minor: info.minor,
            build: info.version,
        })
    }

    fn state(&self) -> ads::Result<(AdsState, u16)> {
        self.client.device(self.target).get_state()
    }

    fn close(self) {
        log::debug!("closing connection from {} to {}", self.client.source(), self.target);
        // Dropping the client shuts down the socket and ends its reader thread.
        drop(self.client);
    }
}
