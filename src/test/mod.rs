// Code used in the crate test suite.

use std::cell::Cell;
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use ads::client::AdsState;
use byteorder::{WriteBytesExt, LE};
use crossbeam_channel::{unbounded, Receiver, Sender};
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::library::{ClientLibrary, Connection, DeviceIdentity, RemoteSystem};
use crate::{Config, Reporter};



/// A configuration pointing to a local port, with a short timeout.
pub fn local_config(tcp_port: u16) -> Config {
    Config {
        ip: Ipv4Addr::LOCALHOST,
        tcp_port,
        timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

/// Run a check and return its outcome along with the printed report.
pub fn run_check<L: ClientLibrary>(library: L, config: Config) -> (crate::Outcome, String) {
    let checker = crate::ConnectionChecker::new(library, config);
    let mut reporter = Reporter::new(Vec::new());
    let outcome = checker.run(&mut reporter);
    (outcome, String::from_utf8(reporter.into_inner()).unwrap())
}

// Configures different ways the server should behave.
#[derive(Clone)]
pub struct ServerOpts {
    pub state: (AdsState, u16),
    // ADS error code to answer every request with.
    pub error: u32,
    // Close the connection instead of replying, like a router without a route.
    pub no_reply: bool,
    pub no_devinfo: bool,
}

impl Default for ServerOpts {
    fn default() -> Self {
        Self { state: (AdsState::Run, 0), error: 0, no_reply: false, no_devinfo: false }
    }
}

/// What the server saw from its clients.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Request(u16),
    Closed,
}

pub struct TestServer {
    pub port: u16,
    events: Receiver<Event>,
}

impl TestServer {
    /// Collect events until the client has closed its connection, or the
    /// timeout runs out.
    pub fn events_until_closed(&self) -> Vec<Event> {
        let mut events = vec![];
        while let Ok(event) = self.events.recv_timeout(Duration::from_secs(5)) {
            let closed = event == Event::Closed;
            events.push(event);
            if closed {
                break;
            }
        }
        events
    }
}

pub fn start_test_server(opts: ServerOpts) -> TestServer {
    let socket = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();
    let (events_send, events) = unbounded();
    thread::spawn(move || {
        let server = Server { opts, events: events_send };
        for client in socket.incoming().flatten() {
            // A check only ever opens one connection.
            server.handle_client(client);
        }
    });
    TestServer { port, events }
}

/// A local port that nothing listens on.
pub fn closed_port() -> u16 {
    let socket = TcpListener::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

struct Server {
    opts: ServerOpts,
    events: Sender<Event>,
}

impl Server {
    fn handle_client(&self, mut socket: TcpStream) {
        loop {
            let mut header = AdsHeader::new_zeroed();
            if socket.read_exact(header.as_bytes_mut()).is_err() {
                // connection was closed
                let _ = self.events.send(Event::Closed);
                return;
            }
            println!("req: {:?}", header);
            let mut data = vec![0; header.data_len.get() as usize];
            if socket.read_exact(&mut data).is_err() {
                let _ = self.events.send(Event::Closed);
                return;
            }
            let _ = self.events.send(Event::Request(header.cmd.get()));

            if self.opts.no_reply {
                return;
            }

            let (reply_data, error) = if self.opts.error != 0 {
                (vec![], self.opts.error)
            } else {
                match header.cmd.get() {
                    1 => self.do_devinfo(&data),
                    4 => self.do_read_state(&data),
                    _ => (vec![], 0x701),
                }
            };

            let mut reply_header = AdsHeader::new_zeroed();
            reply_header.len.set(32 + reply_data.len() as u32);
            reply_header.dst_addr = header.src_addr;
            reply_header.dst_port = header.src_port;
            reply_header.src_addr = header.dst_addr;
            reply_header.src_port = header.dst_port;
            reply_header.cmd = header.cmd;
            reply_header.state.set(header.state.get() | 1);
            reply_header.data_len.set(reply_data.len() as u32);
            reply_header.error.set(error);
            reply_header.inv_id = header.inv_id;
            println!("rep: {:?}", reply_header);

            socket.write_all(reply_header.as_bytes()).unwrap();
            socket.write_all(&reply_data).unwrap();
        }
    }

    fn do_devinfo(&self, data: &[u8]) -> (Vec<u8>, u32) {
        if !data.is_empty() {
            return (vec![], 0x706);
        }
        if self.opts.no_devinfo {
            return (vec![], 0x701);
        }
        // no error, major 2, minor 11
        let mut out = 0u32.to_le_bytes().to_vec();
        out.write_u8(2).unwrap();
        out.write_u8(11).unwrap();
        out.write_u16::<LE>(2300).unwrap();
        out.extend(b"TCatPlcCtrl\0\0\0\0\0");
        (out, 0)
    }

    fn do_read_state(&self, data: &[u8]) -> (Vec<u8>, u32) {
        if !data.is_empty() {
            return (vec![], 0x706);
        }
        let mut out = 0u32.to_le_bytes().to_vec();
        out.write_u16::<LE>(self.opts.state.0 as u16).unwrap();
        out.write_u16::<LE>(self.opts.state.1).unwrap();
        (out, 0)
    }
}

#[derive(FromZeroes, FromBytes, AsBytes, Debug)]
#[repr(C)]
struct AdsHeader {
    pad:      u16,
    len:      U32<LittleEndian>,
    dst_addr: [u8; 6],
    dst_port: U16<LittleEndian>,
    src_addr: [u8; 6],
    src_port: U16<LittleEndian>,
    cmd:      U16<LittleEndian>,
    state:    U16<LittleEndian>,
    data_len: U32<LittleEndian>,
    error:    U32<LittleEndian>,
    inv_id:   U32<LittleEndian>,
}

/// An in-memory client library that counts what the checker does with it.
pub struct FakeLibrary {
    pub present: Cell<bool>,
    pub install_works: bool,
    pub installs: Cell<u32>,
    pub refuse_connection: bool,
    // ADS state, or the ADS error code to fail the state read with.
    pub state: Result<(AdsState, u16), u32>,
    pub identity: Option<DeviceIdentity>,
    pub remote: Option<RemoteSystem>,
    pub closes: Rc<Cell<u32>>,
}

impl Default for FakeLibrary {
    fn default() -> Self {
        Self {
            present: Cell::new(true),
            install_works: false,
            installs: Cell::new(0),
            refuse_connection: false,
            state: Ok((AdsState::Run, 0)),
            identity: Some(DeviceIdentity {
                name: "TCatPlcCtrl".into(),
                major: 2,
                minor: 11,
                build: 2300,
            }),
            remote: None,
            closes: Rc::default(),
        }
    }
}

pub struct FakeConnection {
    state: Result<(AdsState, u16), u32>,
    identity: Option<DeviceIdentity>,
    closes: Rc<Cell<u32>>,
}

impl Connection for FakeConnection {
    fn device_info(&self) -> ads::Result<DeviceIdentity> {
        self.identity.clone()
            .ok_or(ads::Error::Ads("get device info", "Service is not supported by server", 0x701))
    }

    fn state(&self) -> ads::Result<(AdsState, u16)> {
        self.state.map_err(|code| ads::Error::Ads("read state", "ADS error", code))
    }

    fn close(self) {
        self.closes.set(self.closes.get() + 1);
    }
}

impl ClientLibrary for FakeLibrary {
    type Connection = FakeConnection;

    fn name(&self) -> &str {
        "fake-ads"
    }

    fn installed_version(&self) -> Option<String> {
        if self.present.get() { Some("1.0".into()) } else { None }
    }

    fn install(&self) -> Result<(), String> {
        self.installs.set(self.installs.get() + 1);
        if self.install_works {
            self.present.set(true);
            Ok(())
        } else {
            Err("no network".into())
        }
    }

    fn install_instructions(&self) -> String {
        "install fake-ads by hand".into()
    }

    fn connect(&self, _config: &Config) -> ads::Result<FakeConnection> {
        if self.refuse_connection {
            return Err(ads::Error::Io("connecting TCP socket with timeout",
                                      io::ErrorKind::ConnectionRefused.into()));
        }
        Ok(FakeConnection {
            state: self.state,
            identity: self.identity.clone(),
            closes: self.closes.clone(),
        })
    }

    fn identify(&self, _config: &Config) -> ads::Result<RemoteSystem> {
        self.remote.clone()
            .ok_or(ads::Error::Io("receiving UDP reply", io::ErrorKind::TimedOut.into()))
    }
}
