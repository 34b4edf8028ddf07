//! Maps the CNI commands onto kuryr-daemon requests.

use crate::daemon::{DaemonClient, DaemonConfig};
use crate::error::{ErrorWrap, KuryrResult};
use crate::network::result::CniResult;
use crate::plugin::{CmdArgs, Plugin};

pub mod add;
pub mod check;
pub mod del;
pub mod version;

/// The kuryr CNI plugin. A daemon client is created per command from the
/// network configuration of that invocation.
#[derive(Debug, Default)]
pub struct Kuryr {}

impl Kuryr {
    fn client(args: &CmdArgs) -> KuryrResult<DaemonClient> {
        let config = DaemonConfig::load(&args.config).wrap("invalid kuryr-daemon settings")?;
        DaemonClient::new(config)
    }
}

impl Plugin for Kuryr {
    fn add(&self, args: &CmdArgs) -> KuryrResult<CniResult> {
        add::Add::new(args).exec(&Self::client(args)?)
    }

    fn del(&self, args: &CmdArgs) -> KuryrResult<()> {
        del::Del::new(args).exec(&Self::client(args)?)
    }

    fn check(&self, args: &CmdArgs) -> KuryrResult<()> {
        check::Check::new(args).exec()
    }
}
