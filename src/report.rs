//! Human-readable output of a connection check.

use std::fmt::Display;
use std::io::Write;

use crate::errors::{CheckError, Stage};
use crate::library::{DeviceState, RemoteSystem};
use crate::Config;

const RULE_WIDTH: usize = 60;

/// Title of the checklist printed when the PLC could not be reached.
pub const CONNECTION_TROUBLESHOOTING: &str = "Troubleshooting (connection failure):";
/// Title of the checklist printed when the PLC was reached, but ADS did not answer.
pub const QUERY_TROUBLESHOOTING: &str = "Troubleshooting (ADS query failure):";
pub const PASSED: &str = "CONNECTION TEST PASSED!";
pub const FAILED: &str = "CONNECTION TEST FAILED!";

/// The result of a whole check.
#[derive(Debug)]
pub struct Outcome {
    pub result: Result<DeviceState, CheckError>,
    /// What the device reported about itself, if discovery was requested and
    /// the check failed.
    pub remote: Option<RemoteSystem>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(e) if e.stage() == Stage::Config => 2,
            Err(_) => 1,
        }
    }
}

/// Writes progress and result lines of a check.
///
/// Output errors are ignored, the same way `println!` would not report them
/// to the caller.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn line(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{}", text);
    }

    fn rule(&mut self) {
        self.line("=".repeat(RULE_WIDTH));
    }

    pub fn banner(&mut self) {
        self.rule();
        self.line("ADS Connection Test Tool");
        self.line(format_args!("Started {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        self.rule();
    }

    pub fn section(&mut self, title: &str) {
        self.line("");
        self.rule();
        self.line(title);
        self.rule();
    }

    pub fn parameters(&mut self, config: &Config) {
        self.line("");
        self.line("Connection Parameters:");
        self.line(format_args!("  ADS Net ID: {}", config.net_id));
        self.line(format_args!("  PLC IP:     {}", config.ip));
        self.line(format_args!("  ADS Port:   {}", config.ams_port));
        self.line(format_args!("  TCP Port:   {}", config.tcp_port));
        self.line("");
        self.line(format_args!("Attempting to connect (timeout: {} seconds)...",
                               config.timeout.as_secs_f32()));
    }

    pub fn ok(&mut self, text: impl Display) {
        self.line(format_args!("✓ {}", text));
    }

    pub fn warn(&mut self, text: impl Display) {
        self.line(format_args!("⚠ {}", text));
    }

    pub fn fail(&mut self, text: impl Display) {
        self.line(format_args!("✗ {}", text));
    }

    /// Write the final result of the check, with troubleshooting help on failure.
    pub fn report(&mut self, config: &Config, outcome: &Outcome) {
        match &outcome.result {
            Ok(state) => {
                self.ok(format_args!("PLC State: {}", state));
                self.section(PASSED);
            }
            Err(err) => {
                self.line("");
                self.fail(format_args!("ERROR: {}", err));
                self.troubleshooting(config, err);
                if let Some(remote) = &outcome.remote {
                    self.remote(config, remote);
                }
                self.section(FAILED);
            }
        }
        self.flush();
    }

    fn troubleshooting(&mut self, config: &Config, err: &CheckError) {
        let (title, steps) = match err {
            CheckError::Config(_) => return,
            CheckError::DependencyInstall { instructions, .. } => {
                self.line("");
                self.line("Please install the ADS client library manually:");
                self.line(format_args!("  {}", instructions));
                return;
            }
            CheckError::Connection { .. } => (CONNECTION_TROUBLESHOOTING, connection_checklist(config)),
            CheckError::Query { .. } =>
                (QUERY_TROUBLESHOOTING, query_checklist(config, err.is_route_problem())),
        };
        self.line("");
        self.line(title);
        if err.stage() == Stage::Query {
            self.line(format_args!("The PLC accepted the connection on TCP port {}, \
                                    so the network path is fine.", config.tcp_port));
        }
        for (i, step) in steps.iter().enumerate() {
            self.line(format_args!("  {}. {}", i + 1, step));
        }
        if let Some(hint) = err.hint() {
            self.line("");
            self.line(format_args!("Hint: {}", hint));
        }
    }

    fn remote(&mut self, config: &Config, remote: &RemoteSystem) {
        self.line("");
        if remote.net_id == config.net_id {
            self.ok(format_args!("Device answers discovery as {}", remote));
        } else {
            self.fail(format_args!("NetID mismatch: configured {}, device reports {}",
                                   config.net_id, remote));
        }
    }
}

/// The steps to take when the PLC could not be reached at all.
pub fn connection_checklist(config: &Config) -> Vec<String> {
    vec![
        "Verify TwinCAT is running on the target PLC".into(),
        format!("Check that the ADS Net ID {} is correct (format a.b.c.d.e.f)", config.net_id),
        format!("Ensure the PLC IP address is reachable, e.g. `ping {}`", config.ip),
        format!("Verify the firewall allows ADS communication (TCP {}, UDP {})",
                config.tcp_port, config.udp_port),
        "Check that an ADS route for this host is configured on the PLC".into(),
    ]
}

/// The steps to take when the PLC accepted the connection, but the ADS
/// request failed.
///
/// With `route_first`, the NetID and route checks come first, since the
/// error already points at them.
pub fn query_checklist(config: &Config, route_first: bool) -> Vec<String> {
    let runtime = vec![
        format!("Verify the PLC runtime on AMS port {} is started and in RUN mode", config.ams_port),
        "Check that the AMS port matches the runtime (801 for TwinCAT 2, 851 for TwinCAT 3)".into(),
    ];
    let route = vec![
        format!("Check that {} is the PLC's AMS NetID, which can differ from its IP address",
                config.net_id),
        "Check that the ADS route on the PLC names this host's NetID and IP address".into(),
    ];
    let (first, then) = if route_first { (route, runtime) } else { (runtime, route) };
    first.into_iter().chain(then).collect()
}
