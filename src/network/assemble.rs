//! Builds the CNI result from the VIF returned by kuryr-daemon.

use std::net::IpAddr;

use ipnet::IpNet;
use log::debug;

use crate::error::{KuryrError, KuryrResult};
use crate::network::result::{CniResult, Dns, Interface, IpConfig, Route};
use crate::network::types::{Subnet, Vif};

/// Every IP entry points at the one interface we return.
const INTERFACE_INDEX: usize = 0;

/// Map the decoded VIF to the CNI result for interface `ifname` of
/// container `sandbox`. Any invalid address or network fails the whole
/// result, nothing partial is returned.
pub fn assemble(vif: &Vif, ifname: &str, sandbox: &str) -> KuryrResult<CniResult> {
    let interface = Interface {
        name: ifname.to_string(),
        mac: vif.address.clone(),
        sandbox: sandbox.to_string(),
    };

    let mut ips = Vec::with_capacity(vif.network.subnets.len());
    let mut routes = Vec::new();
    let mut dns = Dns::default();

    for (i, subnet) in vif.network.subnets.iter().enumerate() {
        let field = format!("subnets[{}]", i);

        ips.push(ip_config(subnet, &field)?);

        for (j, route) in subnet.routes.iter().enumerate() {
            let dst = parse_net(&route.cidr, &format!("{}.routes[{}].cidr", field, j))?;
            let gw = parse_addr(&route.gateway, &format!("{}.routes[{}].gateway", field, j))?;
            routes.push(Route {
                dst: dst.trunc(),
                gw: Some(gw),
            });
        }

        dns.nameservers.extend(subnet.dns.iter().cloned());
    }

    debug!(
        "assembled {} ip(s) and {} route(s) for interface {}",
        ips.len(),
        routes.len(),
        ifname
    );

    Ok(CniResult {
        interfaces: vec![interface],
        ips,
        routes,
        dns,
    })
}

fn ip_config(subnet: &Subnet, field: &str) -> KuryrResult<IpConfig> {
    let first = subnet.ips.first().ok_or_else(|| {
        KuryrError::validation(format!("{}.ips", field), "", "subnet has no ip address")
    })?;
    let addr = parse_addr(&first.address, &format!("{}.ips[0].address", field))?;
    let cidr = parse_net(&subnet.cidr, &format!("{}.cidr", field))?;

    // Like an IPv4 address, an IPv4-mapped IPv6 address has a 4-byte form.
    let (addr, version) = match addr {
        IpAddr::V4(_) => (addr, "4"),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => (IpAddr::V4(v4), "4"),
            None => (addr, "6"),
        },
    };

    let iface_cidr = format!("{}/{}", addr, cidr.prefix_len());
    let address = iface_cidr
        .parse::<IpNet>()
        .map_err(|e| KuryrError::validation(format!("{}.cidr", field), iface_cidr.as_str(), e))?;

    let gateway = match subnet.gateway.as_deref() {
        None | Some("") => None,
        Some(gw) => Some(parse_addr(gw, &format!("{}.gateway", field))?),
    };

    Ok(IpConfig {
        version: version.to_string(),
        interface: INTERFACE_INDEX,
        address,
        gateway,
    })
}

fn parse_addr(value: &str, field: &str) -> KuryrResult<IpAddr> {
    value
        .parse()
        .map_err(|e| KuryrError::validation(field, value, e))
}

fn parse_net(value: &str, field: &str) -> KuryrResult<IpNet> {
    value
        .parse()
        .map_err(|e| KuryrError::validation(field, value, e))
}
