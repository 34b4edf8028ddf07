//! Attaches the container through kuryr-daemon and builds the CNI result.
use crate::daemon::{DaemonApi, DaemonRequest};
use crate::error::{KuryrError, KuryrResult};
use crate::network::assemble::assemble;
use crate::network::result::CniResult;
use crate::network::types::Vif;
use crate::ovo;
use crate::plugin::{CmdArgs, Command};
use log::{debug, info};

pub struct Add<'a> {
    args: &'a CmdArgs,
}

impl<'a> Add<'a> {
    pub fn new(args: &'a CmdArgs) -> Self {
        Self { args }
    }

    pub fn exec(&self, daemon: &dyn DaemonApi) -> KuryrResult<CniResult> {
        debug!("{:?}", "Calling kuryr-daemon for ADD...");
        let request = DaemonRequest::new(self.args, Command::Add);
        let body = daemon.add_network(&request)?;

        let vif: Vif = ovo::from_slice(&body).map_err(|source| KuryrError::ResponseDecode {
            source,
            body: String::from_utf8_lossy(&body).into_owned(),
        })?;
        debug!("{:#?}", vif);

        let result = assemble(&vif, &self.args.ifname, &self.args.container_id)?;
        info!(
            "container {} attached with mac {}",
            self.args.container_id, vif.address
        );
        Ok(result)
    }
}
