use crate::daemon::{DaemonApi, DaemonRequest};
use crate::error::KuryrResult;
use crate::plugin::{CmdArgs, Command};
use log::{debug, info};

pub struct Del<'a> {
    args: &'a CmdArgs,
}

impl<'a> Del<'a> {
    /// The del command asks kuryr-daemon to undo what ADD did. The daemon
    /// answers without a body so there is nothing to decode.
    pub fn new(args: &'a CmdArgs) -> Self {
        Self { args }
    }

    pub fn exec(&self, daemon: &dyn DaemonApi) -> KuryrResult<()> {
        debug!("{:?}", "Calling kuryr-daemon for DEL...");
        daemon.del_network(&DaemonRequest::new(self.args, Command::Del))?;
        info!("container {} detached", self.args.container_id);
        Ok(())
    }
}
