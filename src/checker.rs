//! The connection check: dependency, connection, state query, report.

use std::io::Write;

use crate::errors::{CheckError, QueryFailure, Stage};
use crate::library::{ClientLibrary, Connection, DeviceState, RemoteSystem};
use crate::report::{Outcome, Reporter};
use crate::session::Session;
use crate::Config;

/// Runs one end-to-end check of a single ADS device.
pub struct ConnectionChecker<L> {
    library: L,
    config: Config,
}

impl<L: ClientLibrary> ConnectionChecker<L> {
    pub fn new(library: L, config: Config) -> Self {
        Self { library, config }
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    /// Make sure the client library is available, and return its version.
    ///
    /// If the library is present, nothing else happens.  Otherwise it is
    /// installed, if the configuration allows that, and looked up again.
    pub fn ensure_dependency_available(&self) -> Result<String, CheckError> {
        let name = self.library.name();
        if let Some(version) = self.library.installed_version() {
            log::debug!("{} {} is available", name, version);
            return Ok(version);
        }

        let unavailable = |reason: String| CheckError::DependencyInstall {
            library: name.into(),
            reason,
            instructions: self.library.install_instructions(),
        };
        if !self.config.allow_install {
            return Err(unavailable("not installed, and automatic installation is disabled".into()));
        }
        log::info!("{} is not installed, trying to install it", name);
        self.library.install().map_err(|e| unavailable(format!("installation failed: {}", e)))?;
        self.library.installed_version()
            .ok_or_else(|| unavailable("still not available after installation".into()))
    }

    /// Connect to the configured device.
    pub fn open_connection(&self) -> Result<Session<L::Connection>, CheckError> {
        log::info!("connecting to {}", self.config);
        let conn = self.library.connect(&self.config).map_err(|source| CheckError::Connection {
            addr: self.config.socket_addr(),
            source,
        })?;
        Ok(Session::new(conn))
    }

    /// Ask the device for its state, to see that the ADS service answers.
    ///
    /// The state is required.  The device info is only informational, since
    /// not every ADS service implements it.
    pub fn query_device_state(&self, session: &Session<L::Connection>) -> Result<DeviceState, CheckError> {
        let conn = session.connection();
        let query_error = |source| CheckError::Query { target: self.config.ams_addr(), source };

        let (ads_state, device_state) = conn.state().map_err(|e| query_error(QueryFailure::Ads(e)))?;
        log::debug!("device state: {:?}/{}", ads_state, device_state);
        let identity = match conn.device_info() {
            Ok(identity) => Some(identity),
            Err(e) => {
                log::warn!("could not read device info: {}", e);
                None
            }
        };
        let state = DeviceState { ads_state, device_state, identity };

        if self.config.require_run && !state.is_running() {
            return Err(query_error(QueryFailure::NotRunning(ads_state)));
        }
        Ok(state)
    }

    /// Release the connection.
    pub fn close_connection(&self, session: Session<L::Connection>) {
        session.close();
    }

    /// Run the whole check, writing progress and the final report.
    pub fn run<W: Write>(&self, reporter: &mut Reporter<W>) -> Outcome {
        reporter.banner();
        let result = self.check(reporter);
        if let Err(e) = &result {
            log::error!("check failed at {} stage: {}", e.stage(), e);
        }
        let remote = match &result {
            Err(e) if self.config.discover && matches!(e.stage(), Stage::Connection | Stage::Query) =>
                self.discover(reporter),
            _ => None,
        };
        let outcome = Outcome { result, remote };
        reporter.report(&self.config, &outcome);
        outcome
    }

    fn check<W: Write>(&self, reporter: &mut Reporter<W>) -> Result<DeviceState, CheckError> {
        self.config.validate()?;

        reporter.section("Checking ADS client library");
        let version = self.ensure_dependency_available()?;
        reporter.ok(format_args!("{} version {} is installed", self.library.name(), version));

        reporter.section("Testing ADS connection");
        reporter.parameters(&self.config);
        let session = self.open_connection()?;
        reporter.ok("Connection opened successfully!");

        let state = self.query_device_state(&session);
        if let Ok(state) = &state {
            match &state.identity {
                Some(identity) => reporter.ok(format_args!("Device Info: {}", identity)),
                None => reporter.warn("Could not read device info"),
            }
        }
        self.close_connection(session);
        reporter.ok("Connection closed successfully!");
        state
    }

    fn discover<W: Write>(&self, reporter: &mut Reporter<W>) -> Option<RemoteSystem> {
        log::info!("asking {}:{} for its NetID", self.config.ip, self.config.udp_port);
        match self.library.identify(&self.config) {
            Ok(remote) => Some(remote),
            Err(e) => {
                log::warn!("NetID discovery failed: {}", e);
                reporter.warn(format_args!("NetID discovery on UDP port {} failed: {}",
                                           self.config.udp_port, e));
                None
            }
        }
    }
}
