//! Shared test fixtures and a one-shot fake kuryr-daemon.


use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::daemon::{DaemonApi, DaemonRequest};
use crate::error::KuryrResult;
use crate::plugin::{CmdArgs, Command};

/// Make sure that the environment isn't modified concurrently.
pub(crate) static SERIAL_TEST: Lazy<Mutex<()>> = Lazy::new(Default::default);

/// addNetwork response of kuryr-daemon for a dual stack pod.
pub(crate) const VIF_RESPONSE: &str = r#"{
    "versioned_object.data": {
        "active": true,
        "address": "fa:16:3e:b8:08:8f",
        "has_traffic_filtering": false,
        "id": "5f6e3e2d-ba0b-4d3e-9d4e-0e8f6f1c2a11",
        "network": {
            "versioned_object.data": {
                "id": "a1b2c3d4-0000-4000-8000-000000000001",
                "mtu": 1450,
                "should_provide_bridge": false,
                "should_provide_vlan": false,
                "subnets": {
                    "versioned_object.data": {
                        "objects": [
                            {
                                "versioned_object.data": {
                                    "cidr": "10.0.0.0/26",
                                    "dns": ["10.0.0.2"],
                                    "gateway": "10.0.0.1",
                                    "ips": {
                                        "versioned_object.data": {
                                            "objects": [
                                                {
                                                    "versioned_object.data": {"address": "10.0.0.37"},
                                                    "versioned_object.name": "FixedIP",
                                                    "versioned_object.namespace": "os_vif",
                                                    "versioned_object.version": "1.0"
                                                }
                                            ]
                                        },
                                        "versioned_object.name": "FixedIPList",
                                        "versioned_object.namespace": "os_vif",
                                        "versioned_object.version": "1.0"
                                    },
                                    "routes": {
                                        "versioned_object.data": {
                                            "objects": [
                                                {
                                                    "versioned_object.data": {
                                                        "cidr": "10.1.0.0/24",
                                                        "gateway": "10.0.0.1"
                                                    },
                                                    "versioned_object.name": "Route",
                                                    "versioned_object.namespace": "os_vif",
                                                    "versioned_object.version": "1.0"
                                                }
                                            ]
                                        },
                                        "versioned_object.name": "RouteList",
                                        "versioned_object.namespace": "os_vif",
                                        "versioned_object.version": "1.0"
                                    }
                                },
                                "versioned_object.name": "Subnet",
                                "versioned_object.namespace": "os_vif",
                                "versioned_object.version": "1.0"
                            },
                            {
                                "versioned_object.data": {
                                    "cidr": "fd00::/64",
                                    "dns": [],
                                    "ips": {
                                        "versioned_object.data": {
                                            "objects": [
                                                {
                                                    "versioned_object.data": {"address": "fd00::25"},
                                                    "versioned_object.name": "FixedIP",
                                                    "versioned_object.namespace": "os_vif",
                                                    "versioned_object.version": "1.0"
                                                }
                                            ]
                                        },
                                        "versioned_object.name": "FixedIPList",
                                        "versioned_object.namespace": "os_vif",
                                        "versioned_object.version": "1.0"
                                    },
                                    "routes": {
                                        "versioned_object.data": {"objects": []},
                                        "versioned_object.name": "RouteList",
                                        "versioned_object.namespace": "os_vif",
                                        "versioned_object.version": "1.0"
                                    }
                                },
                                "versioned_object.name": "Subnet",
                                "versioned_object.namespace": "os_vif",
                                "versioned_object.version": "1.0"
                            }
                        ]
                    },
                    "versioned_object.name": "SubnetList",
                    "versioned_object.namespace": "os_vif",
                    "versioned_object.version": "1.0"
                }
            },
            "versioned_object.name": "Network",
            "versioned_object.namespace": "os_vif",
            "versioned_object.version": "1.1"
        },
        "plugin": "noop",
        "preserve_on_delete": false,
        "vif_name": "tap5f6e3e2d-ba",
        "vlan_id": 3
    },
    "versioned_object.name": "VIFVlanNested",
    "versioned_object.namespace": "os_vif",
    "versioned_object.version": "1.0"
}"#;

pub(crate) fn vif_response() -> Value {
    serde_json::from_str(VIF_RESPONSE).expect("valid fixture")
}

/// Invocation parameters as a runtime would pass them.
pub(crate) fn cmd_args(command: Command) -> CmdArgs {
    CmdArgs {
        command: Some(command),
        container_id: "3f1d7c0b9a4e".to_string(),
        netns: "/var/run/netns/cni-3f1d7c0b".to_string(),
        ifname: "eth0".to_string(),
        args: "IgnoreUnknown=1;K8S_POD_NAMESPACE=default;K8S_POD_NAME=web-0".to_string(),
        path: "/opt/cni/bin".to_string(),
        config: json!({"cniVersion": "0.3.1", "name": "kuryr", "type": "kuryr-cni"}),
    }
}

/// DaemonApi answering every request with the same body.
pub(crate) struct StaticDaemon {
    body: String,
    calls: RefCell<Vec<String>>,
}

impl StaticDaemon {
    pub(crate) fn new(body: &str) -> Self {
        StaticDaemon {
            body: body.to_string(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// CNI_COMMAND of every request received so far.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl DaemonApi for StaticDaemon {
    fn add_network(&self, request: &DaemonRequest) -> KuryrResult<Vec<u8>> {
        self.calls.borrow_mut().push(request.command.to_string());
        Ok(self.body.clone().into_bytes())
    }

    fn del_network(&self, request: &DaemonRequest) -> KuryrResult<()> {
        self.calls.borrow_mut().push(request.command.to_string());
        Ok(())
    }
}

/// What the fake daemon received.
pub(crate) struct RecordedRequest {
    pub(crate) path: String,
    pub(crate) body: Value,
}

/// HTTP server on a random local port answering exactly one request.
pub(crate) struct FakeDaemon {
    addr: SocketAddr,
    handle: JoinHandle<io::Result<RecordedRequest>>,
}

impl FakeDaemon {
    pub(crate) fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake daemon");
        let addr = listener.local_addr().expect("fake daemon address");
        let body = body.to_string();
        let handle = thread::spawn(move || serve_once(listener, status, &body));
        FakeDaemon { addr, handle }
    }

    /// Read the request but never answer it, the connection stays open
    /// for `hold` and is then dropped.
    pub(crate) fn silent(hold: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake daemon");
        let addr = listener.local_addr().expect("fake daemon address");
        let handle = thread::spawn(move || -> io::Result<RecordedRequest> {
            let (stream, _) = listener.accept()?;
            let request = read_request(&stream)?;
            thread::sleep(hold);
            Ok(request)
        });
        FakeDaemon { addr, handle }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait for the request and return it.
    pub(crate) fn request(self) -> RecordedRequest {
        self.handle
            .join()
            .expect("fake daemon panicked")
            .expect("fake daemon failed")
    }
}

fn serve_once(listener: TcpListener, status: u16, body: &str) -> io::Result<RecordedRequest> {
    let (mut stream, _) = listener.accept()?;
    let request = read_request(&stream)?;

    let response = if status == 204 {
        "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string()
    } else {
        format!(
            "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    };
    stream.write_all(response.as_bytes())?;
    stream.flush()?;
    Ok(request)
}

fn read_request(stream: &TcpStream) -> io::Result<RecordedRequest> {
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut payload = vec![0; content_length];
    reader.read_exact(&mut payload)?;

    Ok(RecordedRequest {
        path,
        body: serde_json::from_slice(&payload).unwrap_or(Value::Null),
    })
}

/// URL of a local port nothing listens on.
pub(crate) fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local address");
    drop(listener);
    format!("http://{}", addr)
}
