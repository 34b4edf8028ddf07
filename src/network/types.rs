// Records decoded from the kuryr-daemon addNetwork response.

use crate::ovo::{Field, Item, Schema, Shape, VersionedObject};

/// VIF describes the interface kuryr-daemon plugged for the container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vif {
    /// Network the VIF is attached to.
    #[serde(rename = "network")]
    pub network: Network,

    /// MAC address of the interface.
    #[serde(rename = "address")]
    pub address: String,

    /// Host side device name, not used for the CNI result.
    #[serde(rename = "vif_name")]
    pub vif_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "subnets")]
    pub subnets: Vec<Subnet>,
}

/// Subnet with the addresses assigned to the VIF in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    /// Subnet in CIDR form.
    #[serde(rename = "cidr")]
    pub cidr: String,

    /// Gateway IP. This can be empty if there is no gateway.
    #[serde(rename = "gateway", default)]
    pub gateway: Option<String>,

    /// Fixed IPs, only the first one is configured on the interface.
    #[serde(rename = "ips")]
    pub ips: Vec<Ip>,

    /// Extra routes, may be an empty list.
    #[serde(rename = "routes")]
    pub routes: Vec<Route>,

    /// DNS nameservers, may be an empty list.
    #[serde(rename = "dns")]
    pub dns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip {
    #[serde(rename = "address")]
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Destination in CIDR form.
    #[serde(rename = "cidr")]
    pub cidr: String,

    #[serde(rename = "gateway")]
    pub gateway: String,
}

static VIF: Schema = Schema {
    name: "VIF",
    fields: &[
        Field::required("network", Shape::Object(&NETWORK)),
        Field::required("address", Shape::Str),
        Field::required("vif_name", Shape::Str),
    ],
};

static NETWORK: Schema = Schema {
    name: "Network",
    fields: &[Field::required(
        "subnets",
        Shape::List(Item::Object(&SUBNET)),
    )],
};

static SUBNET: Schema = Schema {
    name: "Subnet",
    fields: &[
        Field::required("cidr", Shape::Str),
        Field::optional("gateway", Shape::Str),
        Field::required("ips", Shape::List(Item::Object(&IP))),
        Field::required("routes", Shape::List(Item::Object(&ROUTE))),
        Field::required("dns", Shape::List(Item::Str)),
    ],
};

static IP: Schema = Schema {
    name: "FixedIP",
    fields: &[Field::required("address", Shape::Str)],
};

static ROUTE: Schema = Schema {
    name: "Route",
    fields: &[
        Field::required("cidr", Shape::Str),
        Field::required("gateway", Shape::Str),
    ],
};

impl VersionedObject for Vif {
    fn schema() -> &'static Schema {
        &VIF
    }
}

impl VersionedObject for Network {
    fn schema() -> &'static Schema {
        &NETWORK
    }
}

impl VersionedObject for Subnet {
    fn schema() -> &'static Schema {
        &SUBNET
    }
}

impl VersionedObject for Ip {
    fn schema() -> &'static Schema {
        &IP
    }
}

impl VersionedObject for Route {
    fn schema() -> &'static Schema {
        &ROUTE
    }
}
