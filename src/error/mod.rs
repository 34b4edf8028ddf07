use std::error::Error;
use std::fmt;
use std::io::Write;

use crate::daemon::DaemonError;
use crate::ovo::DecodeError;

pub type KuryrResult<T> = Result<T, KuryrError>;

// Well-known CNI error codes.
pub const ERR_INCOMPATIBLE_VERSION: u32 = 1;
pub const ERR_INVALID_ENVIRONMENT: u32 = 4;
pub const ERR_IO: u32 = 5;
pub const ERR_DECODING: u32 = 6;
pub const ERR_INVALID_NETWORK_CONFIG: u32 = 7;
pub const ERR_TRY_AGAIN_LATER: u32 = 11;

// Plugin specific codes start at 100.
pub const ERR_PLUGIN: u32 = 100;
pub const ERR_INVALID_RESULT: u32 = 101;
pub const ERR_TIMEOUT: u32 = 200;

/// wrap any result into a KuryrError and add the given msg
#[macro_export]
macro_rules! wrap {
    ($result:expr, $msg:expr) => {
        $result.map_err(|err| $crate::error::KuryrError::wrap($msg, err.into()))
    };
}

pub trait ErrorWrap<T> {
    /// wrap KuryrResult error into a KuryrError and add the given msg
    fn wrap<S>(self, msg: S) -> KuryrResult<T>
    where
        S: Into<String>;
}

impl<T> ErrorWrap<T> for KuryrResult<T> {
    fn wrap<S>(self, msg: S) -> KuryrResult<T>
    where
        S: Into<String>,
    {
        self.map_err(|err| KuryrError::wrap(msg, err))
    }
}

/// The main kuryr-cni error type
#[derive(Debug)]
pub enum KuryrError {
    // A string message reported with a specific CNI error code
    Code(u32, String),
    // A chain of multiple errors
    Chain(String, Box<KuryrError>),

    Io(std::io::Error),

    // The network configuration given on stdin is not valid JSON
    Serde(serde_json::Error),

    // kuryr-daemon could not be reached at all
    Transport {
        url: String,
        source: reqwest::Error,
    },
    // kuryr-daemon answered with an unexpected status code
    Daemon {
        url: String,
        status: u16,
        error: DaemonError,
    },
    // The daemon response is not the expected versioned object
    ResponseDecode {
        source: DecodeError,
        body: String,
    },
    // A decoded value is not a valid address or network
    Validation {
        field: String,
        value: String,
        reason: String,
    },
}

/// CNI error report written to stdout when a command fails.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    #[serde(rename = "cniVersion")]
    pub cni_version: String,
    pub code: u32,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl KuryrError {
    pub fn code<S>(code: u32, msg: S) -> KuryrError
    where
        S: Into<String>,
    {
        KuryrError::Code(code, msg.into())
    }

    pub fn wrap<S>(msg: S, chained: KuryrError) -> KuryrError
    where
        S: Into<String>,
    {
        KuryrError::Chain(msg.into(), Box::new(chained))
    }

    pub fn validation<F, V, R>(field: F, value: V, reason: R) -> KuryrError
    where
        F: Into<String>,
        V: Into<String>,
        R: fmt::Display,
    {
        KuryrError::Validation {
            field: field.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// The CNI error code reported to the runtime.
    pub fn cni_code(&self) -> u32 {
        match self {
            KuryrError::Code(code, _) => *code,
            KuryrError::Chain(_, inner) => inner.cni_code(),
            KuryrError::Io(_) => ERR_IO,
            KuryrError::Serde(_) => ERR_DECODING,
            KuryrError::Transport { source, .. } => {
                if source.is_timeout() {
                    ERR_TIMEOUT
                } else {
                    ERR_TRY_AGAIN_LATER
                }
            }
            // 0 would read as success to the runtime
            KuryrError::Daemon { error, .. } => match error.code() {
                Some(code) if code != 0 => code,
                _ => ERR_PLUGIN,
            },
            KuryrError::ResponseDecode { .. } => ERR_DECODING,
            KuryrError::Validation { .. } => ERR_INVALID_RESULT,
        }
    }

    /// Extra information for the `details` field of the CNI error.
    pub fn details(&self) -> Option<String> {
        match self {
            KuryrError::Chain(_, inner) => inner.details(),
            KuryrError::Transport { source, .. } => {
                let mut details = source.to_string();
                let mut cause = source.source();
                while let Some(err) = cause {
                    details.push_str(&format!(": {}", err));
                    cause = err.source();
                }
                Some(details)
            }
            KuryrError::Daemon { error, .. } => error.details(),
            KuryrError::ResponseDecode { body, .. } => Some(body.clone()),
            _ => None,
        }
    }

    pub fn to_json(&self, cni_version: &str) -> JsonError {
        JsonError {
            cni_version: cni_version.to_string(),
            code: self.cni_code(),
            msg: self.to_string(),
            details: self.details(),
        }
    }

    /// Write the error in the JSON format the CNI runtime expects.
    pub fn write_json<W: Write>(&self, cni_version: &str, mut out: W) -> std::io::Result<()> {
        let json = self.to_json(cni_version);
        serde_json::to_writer(&mut out, &json)?;
        writeln!(out)
    }

    /// Print the error in a standardized JSON format recognized by the
    /// CNI runtime.
    pub fn print_json(&self, cni_version: &str) {
        if let Err(e) = self.write_json(cni_version, std::io::stdout()) {
            println!("failed to write json error: {}: {}", e, self);
        }
    }
}

impl fmt::Display for KuryrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuryrError::Code(_, s) => write!(f, "{}", s),
            KuryrError::Chain(s, e) => write!(f, "{}: {}", s, e),
            KuryrError::Io(e) => write!(f, "IO error: {}", e),
            KuryrError::Serde(e) => write!(f, "JSON Decoding error: {}", e),
            KuryrError::Transport { url, .. } => {
                write!(f, "looks like {} cannot be reached, is kuryr-daemon running?", url)
            }
            KuryrError::Daemon { url, status, error } => {
                write!(f, "kuryr-daemon returned error {} for {}: {}", status, url, error)
            }
            KuryrError::ResponseDecode { source, .. } => {
                write!(f, "error when reading response from kuryr-daemon: {}", source)
            }
            KuryrError::Validation {
                field,
                value,
                reason,
            } => write!(
                f,
                "error when parsing {} {:?} received from kuryr-daemon: {}",
                field, value, reason
            ),
        }
    }
}

impl Error for KuryrError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            KuryrError::Chain(_, inner) => Some(inner.as_ref()),
            KuryrError::Io(e) => Some(e),
            KuryrError::Serde(e) => Some(e),
            KuryrError::Transport { source, .. } => Some(source),
            KuryrError::ResponseDecode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KuryrError {
    fn from(err: std::io::Error) -> KuryrError {
        KuryrError::Io(err)
    }
}

impl From<serde_json::Error> for KuryrError {
    fn from(err: serde_json::Error) -> KuryrError {
        KuryrError::Serde(err)
    }
}
