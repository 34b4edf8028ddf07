//! Requests to the kuryr-daemon HTTP API.

use std::fmt;

use serde_json::Value;

use crate::error::KuryrResult;
use crate::plugin::{CmdArgs, Command};

pub mod client;
pub mod config;

pub use client::DaemonClient;
pub use config::DaemonConfig;

pub const ADD_PATH: &str = "addNetwork";
pub const DEL_PATH: &str = "delNetwork";

/// The kuryr-daemon endpoints used by the plugin.
pub trait DaemonApi {
    /// Ask the daemon to plug the container, returns the raw VIF response.
    fn add_network(&self, request: &DaemonRequest) -> KuryrResult<Vec<u8>>;
    /// Ask the daemon to unplug the container.
    fn del_network(&self, request: &DaemonRequest) -> KuryrResult<()>;
}

/// Body of the addNetwork and delNetwork requests. The daemon reads the
/// invocation under the CNI environment variable names.
#[derive(Debug, Serialize)]
pub struct DaemonRequest<'a> {
    #[serde(rename = "CNI_IFNAME")]
    pub ifname: &'a str,

    #[serde(rename = "CNI_NETNS")]
    pub netns: &'a str,

    #[serde(rename = "CNI_PATH")]
    pub path: &'a str,

    #[serde(rename = "CNI_COMMAND")]
    pub command: &'static str,

    #[serde(rename = "CNI_CONTAINERID")]
    pub container_id: &'a str,

    #[serde(rename = "CNI_ARGS")]
    pub args: &'a str,

    /// The network configuration exactly as read from stdin.
    #[serde(rename = "config_kuryr")]
    pub config: &'a Value,
}

impl<'a> DaemonRequest<'a> {
    pub fn new(args: &'a CmdArgs, command: Command) -> Self {
        DaemonRequest {
            ifname: &args.ifname,
            netns: &args.netns,
            path: &args.path,
            command: command.as_str(),
            container_id: &args.container_id,
            args: &args.args,
            config: &args.config,
        }
    }
}

/// Error reported by the daemon together with an unexpected status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonError {
    /// The daemon sent a JSON error body.
    Structured {
        code: Option<u32>,
        message: String,
        details: Option<String>,
    },
    /// Anything else, possibly empty.
    Raw(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u32>,
    #[serde(alias = "message")]
    msg: String,
    #[serde(default)]
    details: Option<Value>,
}

impl DaemonError {
    /// Interpret the body of a failed request.
    pub fn from_body(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        if text.trim().is_empty() {
            return DaemonError::Raw(String::new());
        }
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(e) => DaemonError::Structured {
                code: e.code,
                message: e.msg,
                details: e.details.map(|d| match d {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
            },
            Err(_) => DaemonError::Raw(text.into_owned()),
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            DaemonError::Structured { code, .. } => *code,
            DaemonError::Raw(_) => None,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            DaemonError::Structured { details, .. } => details.clone(),
            DaemonError::Raw(body) if body.is_empty() => None,
            DaemonError::Raw(body) => Some(body.clone()),
        }
    }
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::Structured { message, .. } => write!(f, "{}", message),
            DaemonError::Raw(body) if body.is_empty() => write!(f, "no error message"),
            DaemonError::Raw(body) => write!(f, "{}", body.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_payload() {
        let args = CmdArgs {
            command: Some(Command::Add),
            container_id: "c0ffee".to_string(),
            netns: "/proc/42/ns/net".to_string(),
            ifname: "eth0".to_string(),
            args: "IgnoreUnknown=1;K8S_POD_NAME=web".to_string(),
            path: "/opt/cni/bin".to_string(),
            config: json!({"cniVersion": "0.3.1", "name": "kuryr", "type": "kuryr-cni"}),
        };

        let payload = serde_json::to_value(DaemonRequest::new(&args, Command::Add)).unwrap();
        assert_eq!(
            payload,
            json!({
                "CNI_IFNAME": "eth0",
                "CNI_NETNS": "/proc/42/ns/net",
                "CNI_PATH": "/opt/cni/bin",
                "CNI_COMMAND": "ADD",
                "CNI_CONTAINERID": "c0ffee",
                "CNI_ARGS": "IgnoreUnknown=1;K8S_POD_NAME=web",
                "config_kuryr": {"cniVersion": "0.3.1", "name": "kuryr", "type": "kuryr-cni"}
            })
        );
    }

    #[test]
    fn structured_error_body() {
        let err = DaemonError::from_body(
            br#"{"code": 120, "message": "port not ready", "details": {"port": "5f6e3e2d"}}"#,
        );
        assert_eq!(
            err,
            DaemonError::Structured {
                code: Some(120),
                message: "port not ready".to_string(),
                details: Some(r#"{"port":"5f6e3e2d"}"#.to_string()),
            }
        );
        assert_eq!(err.code(), Some(120));
        assert_eq!(err.to_string(), "port not ready");
    }

    #[test]
    fn cni_style_error_body() {
        let err = DaemonError::from_body(br#"{"msg": "timed out", "details": "trace"}"#);
        assert_eq!(err.code(), None);
        assert_eq!(err.details().as_deref(), Some("trace"));
        assert_eq!(err.to_string(), "timed out");
    }

    #[test]
    fn raw_error_body() {
        let err = DaemonError::from_body(b"Internal Server Error\n");
        assert_eq!(err, DaemonError::Raw("Internal Server Error\n".to_string()));
        assert_eq!(err.to_string(), "Internal Server Error");
        assert_eq!(err.details().as_deref(), Some("Internal Server Error\n"));

        // JSON without a message is not a structured error
        let err = DaemonError::from_body(br#"{"status": "failed"}"#);
        assert!(matches!(err, DaemonError::Raw(_)));
    }

    #[test]
    fn empty_error_body() {
        let err = DaemonError::from_body(b"  \n");
        assert_eq!(err, DaemonError::Raw(String::new()));
        assert_eq!(err.details(), None);
        assert_eq!(err.to_string(), "no error message");
    }
}
