//! Check that a PLC can be reached using the ADS protocol
//!
//! # Introduction
//!
//! ADS is the native protocol used by programmable logic controllers (PLCs) and
//! the TwinCAT automation system produced by [Beckhoff GmbH](https://www.beckhoff.com/).
//!
//! This crate runs a single diagnostic check against one device: it makes sure
//! the ADS client library is available, opens a connection, reads the device
//! state and reports the outcome, with troubleshooting help for each kind of
//! failure.  The protocol itself is spoken by the [`ads`] crate.

pub mod config;
pub mod errors;
pub mod library;
pub mod session;
pub mod tcp;
pub mod checker;
pub mod report;
pub mod cli;

pub use config::Config;
pub use checker::ConnectionChecker;
pub use errors::{CheckError, ConfigError, QueryFailure, Stage};
pub use library::{ClientLibrary, Connection, DeviceIdentity, DeviceState, RemoteSystem};
pub use report::{Outcome, Reporter};
pub use session::Session;
pub use tcp::AdsTcpLibrary;

#[cfg(test)]
mod test;
