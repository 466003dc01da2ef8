use crate::network::ip::Ipv4Network;
use crate::network::lease::LeasePoolId;
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    Copper,
    Optical,
    Wireless,
    /// An unmanaged interface somewhere on the Internet, outside any simulated LAN
    Public,
}

impl InterfaceKind {
    pub(crate) fn name_prefix(self) -> &'static str {
        match self {
            InterfaceKind::Copper => "eth",
            InterfaceKind::Optical => "opt",
            InterfaceKind::Wireless => "wlan",
            InterfaceKind::Public => "pub",
        }
    }
}

impl Display for InterfaceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InterfaceKind::Copper => "copper",
            InterfaceKind::Optical => "optical",
            InterfaceKind::Wireless => "wireless",
            InterfaceKind::Public => "public",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct InterfaceSpec {
    /// Human-readable name, derived from the kind (e.g. `eth0`) when empty
    pub name: String,
    pub kind: InterfaceKind,
    pub address: Option<Ipv4Addr>,
    pub network: Option<Ipv4Network>,
    pub gateway: Option<Ipv4Addr>,
    /// Pool handing out addresses to interfaces that connect to this one
    pub lease_pool: Option<LeasePoolId>,
}

impl InterfaceSpec {
    pub fn new(kind: InterfaceKind) -> Self {
        Self {
            name: String::new(),
            kind,
            address: None,
            network: None,
            gateway: None,
            lease_pool: None,
        }
    }
}

/// Addressing applied to the connecting interface when the peer doesn't hand out leases
#[derive(Clone, Debug)]
pub struct StaticAddressing {
    pub address: Ipv4Addr,
    pub network: Ipv4Network,
    pub gateway: Option<Ipv4Addr>,
}

/// Physical parameters of a class of links
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkProfile {
    pub latency: Duration,
    pub bandwidth_bps: u64,
}

/// Physical parameters used for every link created in a topology
///
/// Public uplinks always use the optical profile, modelling a fiber backbone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkProfiles {
    pub copper: LinkProfile,
    pub optical: LinkProfile,
    pub wireless: LinkProfile,
}

impl Default for LinkProfiles {
    fn default() -> Self {
        Self {
            copper: LinkProfile {
                latency: Duration::from_millis(1),
                bandwidth_bps: 100_000_000,
            },
            optical: LinkProfile {
                latency: Duration::from_micros(200),
                bandwidth_bps: 1_000_000_000,
            },
            wireless: LinkProfile {
                latency: Duration::from_millis(5),
                bandwidth_bps: 54_000_000,
            },
        }
    }
}
