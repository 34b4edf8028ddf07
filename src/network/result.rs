// CNI result types returned to the container runtime for ADD.

use ipnet::IpNet;
use std::net::IpAddr;

/// CniResult contains the network configuration applied to the container,
/// serialized after the `cniVersion` key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CniResult {
    /// Only ever holds the single interface kuryr-daemon plugged.
    #[serde(rename = "interfaces")]
    pub interfaces: Vec<Interface>,

    #[serde(rename = "ips")]
    pub ips: Vec<IpConfig>,

    #[serde(rename = "routes")]
    pub routes: Vec<Route>,

    #[serde(rename = "dns")]
    pub dns: Dns,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Interface name inside the container, as requested by the runtime.
    #[serde(rename = "name")]
    pub name: String,

    #[serde(rename = "mac")]
    pub mac: String,

    /// Container id owning the interface.
    #[serde(rename = "sandbox")]
    pub sandbox: String,
}

/// IpConfig contains an address assigned to one of the result interfaces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    /// "4" or "6".
    #[serde(rename = "version")]
    pub version: String,

    /// Index into `interfaces`.
    #[serde(rename = "interface")]
    pub interface: usize,

    /// Address of the interface with the prefix length of its subnet.
    #[serde(rename = "address")]
    pub address: IpNet,

    #[serde(rename = "gateway", default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "dst")]
    pub dst: IpNet,

    #[serde(rename = "gw", default, skip_serializing_if = "Option::is_none")]
    pub gw: Option<IpAddr>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    #[serde(rename = "nameservers", default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
}
