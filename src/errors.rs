//! Defines the error types of a connection check.

use std::io;
use std::net::SocketAddrV4;
use std::time::Duration;

use ads::client::AdsState;
use ads::AmsAddr;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid NetID {0:?}, expected six dotted numbers like 5.23.91.23.1.1")]
    InvalidNetId(String),
    #[error("invalid IPv4 address {0:?}")]
    InvalidAddress(String),
    #[error("invalid AMS port {0}")]
    InvalidPort(u16),
    #[error("invalid TCP port {0}")]
    InvalidTcpPort(u16),
    #[error("invalid timeout {0:?}, it must be longer than zero")]
    InvalidTimeout(Duration),
}

/// The stage of a check at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Config,
    Dependency,
    Connection,
    Query,
}

/// Why the device did not answer the state query as expected.
#[derive(Debug, thiserror::Error)]
pub enum QueryFailure {
    /// The ADS request itself failed.
    #[error(transparent)]
    Ads(#[from] ads::Error),
    /// The device answered, but its runtime is not running.
    #[error("device is in state {0:?}, not Run")]
    NotRunning(AdsState),
}

/// A failed connection check.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The client library is missing and could not be installed.
    #[error("{library} is not available: {reason}")]
    DependencyInstall { library: String, reason: String, instructions: String },

    /// The transport connection could not be opened.
    #[error("connecting to {addr} failed: {source}")]
    Connection { addr: SocketAddrV4, source: ads::Error },

    /// The connection was opened, but the ADS service did not answer correctly.
    #[error("querying {target} failed: {source}")]
    Query { target: AmsAddr, source: QueryFailure },
}

impl CheckError {
    /// Return the stage at which the check failed.
    pub fn stage(&self) -> Stage {
        match self {
            CheckError::Config(_) => Stage::Config,
            CheckError::DependencyInstall { .. } => Stage::Dependency,
            CheckError::Connection { .. } => Stage::Connection,
            CheckError::Query { .. } => Stage::Query,
        }
    }

    /// Return a troubleshooting hint specific to the underlying error.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CheckError::Connection { source, .. } => ads_hint(source),
            CheckError::Query { source: QueryFailure::Ads(e), .. } => ads_hint(e),
            CheckError::Query { source: QueryFailure::NotRunning(_), .. } =>
                Some("The PLC runtime answers but is not in RUN mode; start it from TwinCAT."),
            _ => None,
        }
    }

    /// Return true if the query failed in the way a missing ADS route or a
    /// wrong NetID makes it fail: the router doesn't know the target, or the
    /// PLC drops the connection.
    pub fn is_route_problem(&self) -> bool {
        match self {
            CheckError::Query { source: QueryFailure::Ads(ads::Error::Ads(_, _, code)), .. } =>
                *code == 0x7,
            CheckError::Query { source: QueryFailure::Ads(ads::Error::Io(_, ioe)), .. } =>
                matches!(ioe.kind(), io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset |
                         io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe),
            _ => false,
        }
    }
}

/// Hints for ADS error codes that point to a setup problem, sorted by code.
const ADS_HINTS: &[(u32, &str)] = &[
    (0x006, "Target port not found: no ADS service listens on this AMS port, \
             is the PLC runtime started and is it the right port (801 for TwinCAT 2, 851 for TwinCAT 3)?"),
    (0x007, "Target machine not found: the router does not know this NetID, \
             check the NetID and the routes on both sides."),
    (0x00D, "Port not connected: the AMS port on the PLC is not open."),
    (0x012, "Port disabled: the TwinCAT system service is not started."),
    (0x018, "Invalid AMS port."),
    (0x01B, "Host unreachable: the PLC router cannot reach this host, check the route entry."),
    (0x50A, "The AMS router on the PLC is not active; is TwinCAT running?"),
    (0x701, "Service not supported: the AMS port probably belongs to a different kind of service."),
    (0x707, "The device is not in a ready state."),
    (0x719, "The device timed out while handling the request."),
    (0x745, "Timeout elapsed: check the route setting on the PLC."),
    (0x748, "ADS port not opened."),
];

/// Return a troubleshooting hint for an error from the ADS client, if one is known.
pub fn ads_hint(err: &ads::Error) -> Option<&'static str> {
    match err {
        ads::Error::Ads(_, _, code) => ADS_HINTS
            .binary_search_by_key(code, |e| e.0)
            .ok()
            .map(|idx| ADS_HINTS[idx].1),
        ads::Error::Io(_, ioe) => io_hint(ioe.kind()),
        _ => None,
    }
}

fn io_hint(kind: io::ErrorKind) -> Option<&'static str> {
    Some(match kind {
        io::ErrorKind::ConnectionRefused =>
            "Connection refused: nothing listens on the ADS TCP port, is the TwinCAT router running?",
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock =>
            "No answer within the timeout: the host is down, a firewall drops the packets, \
             or the PLC has no ADS route for this host.",
        io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset |
        io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe =>
            "The PLC closed the connection: this usually means no ADS route is configured \
             for this host's NetID and IP address.",
        io::ErrorKind::AddrNotAvailable =>
            "The address is not usable from this host.",
        _ => return None,
    })
}
