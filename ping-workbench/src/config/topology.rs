use anyhow::{Context as _, bail};
use fastrand::Rng;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use topology_sim::network::Topology;
use topology_sim::network::interface::InterfaceId;
use topology_sim::network::ip::Ipv4Network;
use topology_sim::network::lease::LeasePoolId;
use topology_sim::network::spec::{
    InterfaceKind, InterfaceSpec, LinkProfile, LinkProfiles, StaticAddressing,
};
use topology_sim::trace::tracer::SimulationStepTracer;

#[derive(Deserialize, Clone)]
pub struct TopologyJson {
    #[serde(default)]
    link_profiles: LinkProfilesJson,
    #[serde(default)]
    lease_pools: Vec<LeasePoolJson>,
    interfaces: Vec<InterfaceJson>,
    /// Applied in order, after every interface has been created
    #[serde(default)]
    connections: Vec<ConnectionJson>,
}

/// Overrides for the default link profiles
#[derive(Deserialize, Clone, Default)]
struct LinkProfilesJson {
    copper: Option<LinkProfileJson>,
    optical: Option<LinkProfileJson>,
    wireless: Option<LinkProfileJson>,
}

#[derive(Deserialize, Clone, Copy)]
struct LinkProfileJson {
    /// The one-way latency of the link, in microseconds
    latency_us: u64,
    /// The link's bandwidth, in bits per second
    bandwidth_bps: u64,
}

#[serde_as]
#[derive(Deserialize, Clone)]
struct LeasePoolJson {
    id: String,
    #[serde_as(as = "DisplayFromStr")]
    start: Ipv4Addr,
    /// The last address of the pool, which can be leased too
    #[serde_as(as = "DisplayFromStr")]
    end: Ipv4Addr,
}

#[serde_as]
#[derive(Deserialize, Clone)]
struct InterfaceJson {
    /// Derived from the interface's kind when missing
    #[serde(default)]
    name: String,
    kind: InterfaceKindJson,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    address: Option<Ipv4Addr>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    network: Option<Ipv4Network>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    gateway: Option<Ipv4Addr>,
    /// The id of the lease pool used to hand out addresses to the interface's peers
    #[serde(default)]
    lease_pool: Option<String>,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
enum InterfaceKindJson {
    Copper,
    Optical,
    Wireless,
    Public,
}

/// Links `source` to `target`, optionally with static addressing for `source`
#[serde_as]
#[derive(Deserialize, Clone)]
struct ConnectionJson {
    source: String,
    target: String,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    address: Option<Ipv4Addr>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    network: Option<Ipv4Network>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    gateway: Option<Ipv4Addr>,
}

impl From<InterfaceKindJson> for InterfaceKind {
    fn from(kind: InterfaceKindJson) -> Self {
        match kind {
            InterfaceKindJson::Copper => InterfaceKind::Copper,
            InterfaceKindJson::Optical => InterfaceKind::Optical,
            InterfaceKindJson::Wireless => InterfaceKind::Wireless,
            InterfaceKindJson::Public => InterfaceKind::Public,
        }
    }
}

impl TryFrom<LinkProfileJson> for LinkProfile {
    type Error = anyhow::Error;

    fn try_from(json: LinkProfileJson) -> anyhow::Result<Self> {
        if json.bandwidth_bps == 0 {
            bail!("link bandwidth must be greater than zero");
        }

        Ok(LinkProfile {
            latency: Duration::from_micros(json.latency_us),
            bandwidth_bps: json.bandwidth_bps,
        })
    }
}

impl TryFrom<LinkProfilesJson> for LinkProfiles {
    type Error = anyhow::Error;

    fn try_from(json: LinkProfilesJson) -> anyhow::Result<Self> {
        let mut profiles = LinkProfiles::default();
        if let Some(copper) = json.copper {
            profiles.copper = copper.try_into().context("invalid copper link profile")?;
        }
        if let Some(optical) = json.optical {
            profiles.optical = optical.try_into().context("invalid optical link profile")?;
        }
        if let Some(wireless) = json.wireless {
            profiles.wireless = wireless
                .try_into()
                .context("invalid wireless link profile")?;
        }

        Ok(profiles)
    }
}

/// A topology built from its JSON description, with its lease pools in declaration order
pub struct LoadedTopology {
    pub topology: Topology,
    pub lease_pools: Vec<(Arc<str>, LeasePoolId)>,
}

impl TopologyJson {
    pub fn build(
        self,
        tracer: Arc<SimulationStepTracer>,
        rng: Rng,
    ) -> anyhow::Result<LoadedTopology> {
        let profiles = LinkProfiles::try_from(self.link_profiles)?;
        let mut topology = Topology::new(profiles, tracer, rng);

        let mut pools_by_id = HashMap::new();
        let mut lease_pools = Vec::new();
        for pool in self.lease_pools {
            if pools_by_id.contains_key(&pool.id) {
                bail!("duplicate lease pool `{}`", pool.id);
            }

            let id = topology.add_lease_pool(pool.start, pool.end);
            lease_pools.push((pool.id.as_str().into(), id));
            pools_by_id.insert(pool.id, id);
        }

        let mut interfaces_by_name = HashMap::new();
        for interface in self.interfaces {
            let lease_pool = match &interface.lease_pool {
                Some(pool) => Some(*pools_by_id.get(pool).with_context(|| {
                    format!(
                        "interface `{}` refers to unknown lease pool `{pool}`",
                        interface.name
                    )
                })?),
                None => None,
            };

            let spec = InterfaceSpec {
                name: interface.name,
                kind: interface.kind.into(),
                address: interface.address,
                network: interface.network,
                gateway: interface.gateway,
                lease_pool,
            };
            if interfaces_by_name.contains_key(&spec.name) {
                bail!("duplicate interface `{}`", spec.name);
            }

            let description = if spec.name.is_empty() {
                format!("unnamed {} interface", spec.kind)
            } else {
                format!("interface `{}`", spec.name)
            };
            let id = topology
                .add_interface(spec)
                .with_context(|| format!("invalid {description}"))?;
            interfaces_by_name.insert(topology.interface(id).name().to_string(), id);
        }

        for connection in self.connections {
            let source = interface_id(&interfaces_by_name, &connection.source)?;
            let target = interface_id(&interfaces_by_name, &connection.target)?;

            let addressing = match (connection.address, connection.network) {
                (Some(address), Some(network)) => Some(StaticAddressing {
                    address,
                    network,
                    gateway: connection.gateway,
                }),
                (None, None) if connection.gateway.is_none() => None,
                _ => bail!(
                    "connection from `{}` to `{}` must provide both an address and a network, or no addressing at all",
                    connection.source,
                    connection.target
                ),
            };

            topology
                .connect(source, target, addressing)
                .with_context(|| {
                    format!(
                        "failed to connect `{}` to `{}`",
                        connection.source, connection.target
                    )
                })?;
        }

        Ok(LoadedTopology {
            topology,
            lease_pools,
        })
    }
}

fn interface_id(
    interfaces_by_name: &HashMap<String, InterfaceId>,
    name: &str,
) -> anyhow::Result<InterfaceId> {
    interfaces_by_name
        .get(name)
        .copied()
        .with_context(|| format!("unknown interface `{name}`"))
}
