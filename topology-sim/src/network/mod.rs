//! In-memory network topology
//!
//! The [`Topology`] is an arena owning every interface, link and lease pool. Everything else
//! refers to them through stable ids, so interfaces and links can point at each other without
//! owning each other.

pub mod error;
pub mod interface;
pub mod ip;
pub mod lease;
pub mod link;
pub mod packet;
pub mod ping;
pub mod spec;

use crate::network::error::NetworkError;
use crate::network::interface::{Interface, InterfaceId};
use crate::network::ip::Ipv4Network;
use crate::network::lease::{LeasePool, LeasePoolId};
use crate::network::link::{Link, LinkId, LinkKind};
use crate::network::packet::Packet;
use crate::network::ping::{PingOptions, PingReport, PingSession};
use crate::network::spec::{InterfaceKind, InterfaceSpec, LinkProfiles, StaticAddressing};
use crate::trace::tracer::SimulationStepTracer;
use fastrand::Rng;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

pub struct Topology {
    profiles: LinkProfiles,
    interfaces: Vec<Interface>,
    /// Removed links leave an empty slot behind, so link ids stay stable
    links: Vec<Option<Link>>,
    lease_pools: Vec<LeasePool>,
    interfaces_per_kind: HashMap<InterfaceKind, usize>,
    tracer: Arc<SimulationStepTracer>,
    rng: Mutex<Rng>,
    next_packet_number: AtomicU64,
}

/// Addressing that `connect` will apply once every check has passed
struct PendingAddressing {
    address: Ipv4Addr,
    network: Option<Ipv4Network>,
    gateway: Option<Ipv4Addr>,
    lease_pool: Option<LeasePoolId>,
}

impl Topology {
    /// Creates an empty topology
    ///
    /// The rng is only used to generate packet ids for the replay log, so seeding it makes runs
    /// fully reproducible.
    pub fn new(profiles: LinkProfiles, tracer: Arc<SimulationStepTracer>, rng: Rng) -> Self {
        Self {
            profiles,
            interfaces: Vec::new(),
            links: Vec::new(),
            lease_pools: Vec::new(),
            interfaces_per_kind: HashMap::new(),
            tracer,
            rng: Mutex::new(rng),
            next_packet_number: AtomicU64::new(0),
        }
    }

    pub fn profiles(&self) -> &LinkProfiles {
        &self.profiles
    }

    pub fn tracer(&self) -> &Arc<SimulationStepTracer> {
        &self.tracer
    }

    pub fn add_lease_pool(&mut self, start: Ipv4Addr, end_inclusive: Ipv4Addr) -> LeasePoolId {
        let id = LeasePoolId(self.lease_pools.len());
        self.lease_pools
            .push(LeasePool::new(id, start, end_inclusive));
        id
    }

    /// Adds an interface to the topology
    ///
    /// Names are unique. An unnamed interface is named after its kind and the number of
    /// interfaces of that kind (e.g. `eth0`), skipping names that are already taken.
    pub fn add_interface(&mut self, spec: InterfaceSpec) -> Result<InterfaceId, NetworkError> {
        let id = InterfaceId(self.interfaces.len());
        let mut index = self.interfaces_per_kind.get(&spec.kind).copied().unwrap_or(0);
        let name: Arc<str> = if spec.name.is_empty() {
            let mut name = format!("{}{index}", spec.kind.name_prefix());
            while self.interface_by_name(&name).is_some() {
                index += 1;
                name = format!("{}{index}", spec.kind.name_prefix());
            }
            name.into()
        } else if self.interface_by_name(&spec.name).is_some() {
            return Err(NetworkError::DuplicateInterfaceName {
                name: spec.name.as_str().into(),
            });
        } else {
            spec.name.as_str().into()
        };

        let kind = spec.kind;
        let interface = Interface::new(id, name, spec)?;
        self.interfaces.push(interface);
        self.interfaces_per_kind.insert(kind, index + 1);

        Ok(id)
    }

    pub fn interface(&self, id: InterfaceId) -> &Interface {
        &self.interfaces[id.0]
    }

    /// Gives access to the interface's address mutators
    pub fn interface_mut(&mut self, id: InterfaceId) -> &mut Interface {
        &mut self.interfaces[id.0]
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn interface_by_name(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name().as_ref() == name)
    }

    pub fn interface_by_address(&self, address: Ipv4Addr) -> Option<&Interface> {
        self.interfaces
            .iter()
            .find(|i| i.address() == Some(address))
    }

    /// Returns the link, unless it has been removed by a disconnect
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0).and_then(|l| l.as_ref())
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().flatten()
    }

    pub fn lease_pool(&self, id: LeasePoolId) -> &LeasePool {
        &self.lease_pools[id.0]
    }

    /// Addresses currently leased from the pool, in increasing order
    pub fn leased_addresses(&self, id: LeasePoolId) -> Vec<Ipv4Addr> {
        self.lease_pools[id.0]
            .leases()
            .iter()
            .filter_map(|&interface| self.interface(interface).address())
            .collect()
    }

    /// Links `source` to `peer`
    ///
    /// If the peer hands out leases, `source` joins the peer's network and gets the lowest free
    /// address from its pool. Otherwise the provided static addressing, if any, is applied to
    /// `source`. The operation is atomic: on error, neither interface nor the lease pool are
    /// modified (besides dropping stale leases).
    pub fn connect(
        &mut self,
        source: InterfaceId,
        peer: InterfaceId,
        addressing: Option<StaticAddressing>,
    ) -> Result<LinkId, NetworkError> {
        let source_interface = &self.interfaces[source.0];
        let peer_interface = &self.interfaces[peer.0];
        if source == peer {
            return Err(NetworkError::SelfConnection {
                interface: source_interface.name().clone(),
            });
        }

        // Work out the new addressing before touching anything
        let pending = if let Some(pool) = peer_interface.lease_pool() {
            let network = peer_interface.network();
            let gateway = peer_interface.gateway();
            let address = self.lease_pools[pool.0].next_free(source, &self.interfaces)?;
            Some(PendingAddressing {
                address,
                network,
                gateway,
                lease_pool: Some(pool),
            })
        } else {
            addressing.map(|a| PendingAddressing {
                address: a.address,
                network: Some(a.network),
                gateway: a.gateway,
                lease_pool: None,
            })
        };

        if let Some(pending) = &pending {
            if let Some(gateway) = pending.gateway {
                source_interface.check_host(pending.network, gateway)?;
            }
            source_interface.check_host(pending.network, pending.address)?;
        }

        // Commit
        if let Some(pending) = pending {
            let interface = &mut self.interfaces[source.0];
            interface.network = pending.network;
            interface.gateway = pending.gateway;
            interface.address = Some(pending.address);

            if let Some(pool) = pending.lease_pool {
                self.lease_pools[pool.0].record(source, &self.interfaces);
            }
        }

        if let Some(old_link) = self.interfaces[source.0].link_to(peer) {
            self.links[old_link.0] = None;
        }

        let source_interface = &self.interfaces[source.0];
        let peer_interface = &self.interfaces[peer.0];
        let id = LinkId(self.links.len());
        let kind = LinkKind::between(source_interface.kind(), peer_interface.kind());
        let name = format!("{}-{}", source_interface.name(), peer_interface.name()).into();
        self.links.push(Some(Link::new(
            id,
            name,
            [source, peer],
            kind,
            &self.profiles,
        )));

        self.interfaces[source.0].links.insert(peer, id);
        self.interfaces[peer.0].links.insert(source, id);

        Ok(id)
    }

    /// Removes the link between `source` and `peer`
    ///
    /// Disconnecting forfeits the addressing of `source`, as if its lease had expired.
    pub fn disconnect(&mut self, source: InterfaceId, peer: InterfaceId) -> Result<(), NetworkError> {
        let Some(link) = self.interfaces[source.0].link_to(peer) else {
            return Err(NetworkError::NoNetworkConnection {
                interface: self.interfaces[source.0].name().clone(),
                peer: self.interfaces[peer.0].name().clone(),
            });
        };

        self.interfaces[source.0].links.remove(&peer);
        self.interfaces[peer.0].links.remove(&source);
        self.links[link.0] = None;
        self.interfaces[source.0].reset_addressing();

        Ok(())
    }

    /// Frees the address in the pool, so it can be leased again
    pub fn release_lease(&mut self, pool: LeasePoolId, address: Ipv4Addr) {
        self.lease_pools[pool.0].release(address, &self.interfaces);
    }

    /// Pings `destination` from `source`, returning the total time needed to reach it
    pub fn ping(&self, source: InterfaceId, destination: &str) -> Result<Duration, NetworkError> {
        self.ping_with(source, destination, PingOptions::default())
            .map(|report| report.elapsed)
    }

    pub fn ping_with(
        &self,
        source: InterfaceId,
        destination: &str,
        options: PingOptions,
    ) -> Result<PingReport, NetworkError> {
        self.ping_session(source, destination, options)?.run()
    }

    /// Starts a ping that can be resolved one hop at a time
    pub fn ping_session(
        &self,
        source: InterfaceId,
        destination: &str,
        options: PingOptions,
    ) -> Result<PingSession<'_>, NetworkError> {
        PingSession::new(self, source, destination, options)
    }

    pub(crate) fn next_ping_packet(&self, source: Ipv4Addr, destination: Ipv4Addr) -> Packet {
        let id = Uuid::from_u128(self.rng.lock().u128(..));
        let number = self.next_packet_number.fetch_add(1, Ordering::Relaxed);
        Packet::ping(id, number, source, destination)
    }
}
