//! Command line arguments of the `ads-conncheck` binary.

use std::time::Duration;

use clap::Parser;
use parse_int::parse;

use crate::config::{self, Config};
use crate::errors::ConfigError;

#[derive(Parser, Debug)]
#[clap(name = "ads-conncheck", version)]
/// Check the ADS connection to a TwinCAT PLC.
///
/// Without arguments, the built-in target is checked.
pub struct Args {
    /// AMS NetID of the PLC, like 5.23.91.23.1.1
    #[clap(long, default_value = config::NET_ID)]
    netid: String,

    /// IP address of the PLC
    #[clap(long, default_value = config::PLC_IP)]
    ip: String,

    /// AMS port of the ADS service, can be 0x321
    #[clap(long, value_parser = parse_u16, default_value_t = config::AMS_PORT)]
    port: u16,

    /// TCP port of the AMS router, can be 0xBF02
    #[clap(long, value_parser = parse_u16, default_value_t = config::TCP_PORT)]
    tcp_port: u16,

    /// UDP port used for NetID discovery, can be 0xBF03
    #[clap(long, value_parser = parse_u16, default_value_t = config::UDP_PORT)]
    udp_port: u16,

    /// timeout for connecting and for each request, in seconds
    #[clap(long, default_value_t = config::TIMEOUT.as_secs())]
    timeout: u64,

    /// accept a PLC that answers but is not in RUN mode
    #[clap(long)]
    allow_stopped: bool,

    /// after a failure, ask the PLC for its NetID over UDP
    #[clap(long)]
    discover: bool,

    /// try to install the ADS client library if it is missing
    #[clap(long)]
    install: bool,

    /// log what is going on
    #[clap(short, long)]
    pub verbose: bool,
}

fn parse_u16(s: &str) -> Result<u16, String> {
    parse::<u16>(s).map_err(|e| e.to_string())
}

impl Args {
    /// Merge the arguments into the built-in configuration and validate it.
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let config = Config {
            tcp_port: self.tcp_port,
            udp_port: self.udp_port,
            timeout: Duration::from_secs(self.timeout),
            require_run: !self.allow_stopped,
            allow_install: self.install,
            discover: self.discover,
            ..Config::from_parts(&self.netid, &self.ip, self.port)?
        };
        config.validate()?;
        Ok(config)
    }
}
