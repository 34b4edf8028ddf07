//! CNI invocation handling: reads the CNI environment and the network
//! configuration from stdin, calls the matching [`Plugin`] function and
//! writes the result or error JSON to stdout.

use std::{
    collections::HashMap,
    ffi::OsString,
    fmt,
    io::{self, Read, Write},
    str::FromStr,
};

use clap::{error::ErrorKind, Parser};
use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::{KuryrError, KuryrResult, ERR_INCOMPATIBLE_VERSION, ERR_INVALID_ENVIRONMENT},
    network::result::CniResult,
    wrap,
};

/// cniVersion assumed when the network configuration does not set one.
pub const DEFAULT_CNI_VERSION: &str = "0.3.1";
/// Versions sharing the result format we produce, newest last.
pub const SUPPORTED_VERSIONS: &[&str] = &["0.3.0", "0.3.1", "0.4.0"];

/// The CNI_COMMAND values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Add,
    Del,
    Check,
    Version,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Add => "ADD",
            Command::Del => "DEL",
            Command::Check => "CHECK",
            Command::Version => "VERSION",
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(Command::Add),
            "DEL" => Ok(Command::Del),
            "CHECK" => Ok(Command::Check),
            "VERSION" => Ok(Command::Version),
            unknown => Err(format!("unknown CNI_COMMAND: {}", unknown)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The invocation parameters. The runtime passes them as environment
/// variables; the flags exist for manual debugging.
#[derive(Parser, Clone, Debug)]
#[command(version, about = "CNI plugin forwarding requests to kuryr-daemon")]
pub struct CmdArgs {
    /// Operation to run: ADD, DEL, CHECK or VERSION
    #[arg(long, env = "CNI_COMMAND")]
    pub command: Option<Command>,
    /// Container ID
    #[arg(long, env = "CNI_CONTAINERID", default_value = "")]
    pub container_id: String,
    /// Path to the network namespace of the container
    #[arg(long, env = "CNI_NETNS", default_value = "")]
    pub netns: String,
    /// Name of the interface to create inside the container
    #[arg(long, env = "CNI_IFNAME", default_value = "")]
    pub ifname: String,
    /// Extra arguments passed in by the user at invocation time
    #[arg(long, env = "CNI_ARGS", default_value = "")]
    pub args: String,
    /// List of paths to search for CNI plugin executables
    #[arg(long, env = "CNI_PATH", default_value = "")]
    pub path: String,
    /// Network configuration read from stdin
    #[arg(skip)]
    pub config: Value,
}

impl CmdArgs {
    /// Make sure every variable the command needs was given.
    pub fn validate(&self, command: Command) -> KuryrResult<()> {
        let required = match command {
            Command::Add | Command::Check => vec![
                ("CNI_CONTAINERID", self.container_id.as_str()),
                ("CNI_NETNS", self.netns.as_str()),
                ("CNI_IFNAME", self.ifname.as_str()),
                ("CNI_PATH", self.path.as_str()),
            ],
            // the namespace may already be gone when deleting
            Command::Del => vec![
                ("CNI_CONTAINERID", self.container_id.as_str()),
                ("CNI_IFNAME", self.ifname.as_str()),
                ("CNI_PATH", self.path.as_str()),
            ],
            Command::Version => vec![],
        };

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(KuryrError::code(
                ERR_INVALID_ENVIRONMENT,
                format!("required env variables [{}] missing", missing.join(",")),
            ))
        }
    }

    /// cniVersion requested by the network configuration.
    pub fn cni_version(&self) -> &str {
        self.config
            .get("cniVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CNI_VERSION)
    }
}

/// Contains info about this plugin
#[derive(Serialize)]
pub struct Info {
    /// The version of this plugin.
    version: String,
    /// CNI versions this plugin can talk.
    #[serde(rename = "supportedVersions")]
    supported_versions: Vec<String>,
    /// Optional fields you want to be displayed for the info command
    #[serde(flatten)]
    extra_info: Option<HashMap<String, String>>,
}

impl Info {
    pub fn new(version: String, extra_info: Option<HashMap<String, String>>) -> Self {
        Self {
            version,
            supported_versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
            extra_info,
        }
    }
}

/// Output of the VERSION command.
#[derive(Serialize)]
struct VersionInfo<'a> {
    #[serde(rename = "cniVersion")]
    cni_version: &'a str,
    #[serde(rename = "supportedVersions")]
    supported_versions: &'a [&'a str],
}

/// A result document prefixed with the negotiated cniVersion.
#[derive(Serialize)]
struct Versioned<'a, T> {
    #[serde(rename = "cniVersion")]
    cni_version: &'a str,
    #[serde(flatten)]
    inner: &'a T,
}

/// Define the plugin functions
pub trait Plugin {
    /// attach the container to the network
    fn add(&self, args: &CmdArgs) -> KuryrResult<CniResult>;
    /// detach the container from the network
    fn del(&self, args: &CmdArgs) -> KuryrResult<()>;
    /// verify the container network
    fn check(&self, args: &CmdArgs) -> KuryrResult<()>;
}

pub struct PluginExec<P: Plugin> {
    plugin: P,
    info: Info,
}

impl<P: Plugin> PluginExec<P> {
    pub fn new(plugin: P, info: Info) -> Self {
        PluginExec { plugin, info }
    }

    /// Run one CNI command for this process and exit with status 1 on
    /// failure.
    pub fn exec(&self) {
        let stdout = io::stdout();
        let result = self.exec_with(std::env::args_os(), io::stdin().lock(), stdout.lock());
        if let Err((err, cni_version)) = result {
            debug!("{} failed: {}", env!("CARGO_PKG_NAME"), err);
            err.print_json(&cni_version);
            std::process::exit(1);
        }
    }

    /// Like [`exec`](Self::exec) but with explicit argv and stdio. The error
    /// comes back with the cniVersion it must be reported with.
    pub fn exec_with<I, T, R, W>(
        &self,
        argv: I,
        stdin: R,
        mut stdout: W,
    ) -> Result<(), (KuryrError, String)>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        R: Read,
        W: Write,
    {
        let mut args = match CmdArgs::try_parse_from(argv) {
            Ok(args) => args,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => {
                let msg = e.to_string();
                let msg = msg.lines().next().unwrap_or_default().trim_start_matches("error: ");
                return Err((
                    KuryrError::code(ERR_INVALID_ENVIRONMENT, msg),
                    DEFAULT_CNI_VERSION.to_string(),
                ));
            }
        };

        let command = match args.command {
            Some(command) => command,
            None => {
                return self
                    .print_info(&mut stdout)
                    .map_err(|e| (e, DEFAULT_CNI_VERSION.to_string()))
            }
        };

        if command == Command::Version {
            return self
                .print_version(&mut stdout)
                .map_err(|e| (e, DEFAULT_CNI_VERSION.to_string()));
        }

        args.config = read_config(stdin).map_err(|e| (e, DEFAULT_CNI_VERSION.to_string()))?;
        let cni_version = args.cni_version().to_string();
        self.dispatch(command, &args, &cni_version, &mut stdout)
            .map_err(|e| (e, cni_version))
    }

    fn dispatch<W: Write>(
        &self,
        command: Command,
        args: &CmdArgs,
        cni_version: &str,
        stdout: &mut W,
    ) -> KuryrResult<()> {
        if !SUPPORTED_VERSIONS.contains(&cni_version) {
            return Err(KuryrError::code(
                ERR_INCOMPATIBLE_VERSION,
                format!(
                    "incompatible CNI versions; config is {:?}, plugin supports {:?}",
                    cni_version, SUPPORTED_VERSIONS
                ),
            ));
        }
        args.validate(command)?;
        debug!("running {} for container {}", command, args.container_id);

        match command {
            Command::Add => {
                let result = self.plugin.add(args)?;
                write_json(
                    stdout,
                    &Versioned {
                        cni_version,
                        inner: &result,
                    },
                )?;
            }
            Command::Del => self.plugin.del(args)?,
            Command::Check => self.plugin.check(args)?,
            Command::Version => self.print_version(stdout)?,
        }
        Ok(())
    }

    fn print_version<W: Write>(&self, stdout: &mut W) -> KuryrResult<()> {
        let latest = SUPPORTED_VERSIONS[SUPPORTED_VERSIONS.len() - 1];
        write_json(
            stdout,
            &VersionInfo {
                cni_version: latest,
                supported_versions: SUPPORTED_VERSIONS,
            },
        )
    }

    fn print_info<W: Write>(&self, stdout: &mut W) -> KuryrResult<()> {
        write_json(stdout, &self.info)
    }
}

fn read_config<R: Read>(mut stdin: R) -> KuryrResult<Value> {
    let mut buffer = Vec::new();
    wrap!(
        stdin.read_to_end(&mut buffer),
        "failed to read network configuration"
    )?;
    let config: Value = serde_json::from_slice(&buffer)?;
    Ok(config)
}

fn write_json<W: Write, T: Serialize>(stdout: &mut W, value: &T) -> KuryrResult<()> {
    serde_json::to_writer(&mut *stdout, value)?;
    Ok(writeln!(stdout)?)
}
