//! DHCP-like address allocation
//!
//! A pool doesn't own the interfaces it leases addresses to. Leases whose interface has lost its
//! address (e.g. because it was disconnected) are considered stale and pruned lazily, before each
//! allocation or release.

use crate::network::error::NetworkError;
use crate::network::interface::{Interface, InterfaceId};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeasePoolId(pub(crate) usize);

#[derive(Clone, Debug)]
pub struct LeasePool {
    pub(crate) id: LeasePoolId,
    start: Ipv4Addr,
    end_inclusive: Ipv4Addr,
    /// Leased interfaces, sorted by address
    leases: Vec<InterfaceId>,
}

impl LeasePool {
    pub(crate) fn new(id: LeasePoolId, start: Ipv4Addr, end_inclusive: Ipv4Addr) -> Self {
        Self {
            id,
            start,
            end_inclusive,
            leases: Vec::new(),
        }
    }

    pub fn id(&self) -> LeasePoolId {
        self.id
    }

    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    pub fn end_inclusive(&self) -> Ipv4Addr {
        self.end_inclusive
    }

    /// The interfaces currently holding a lease, sorted by address
    ///
    /// Stale leases are only dropped by the next allocation or release, so they may still show up
    /// here.
    pub fn leases(&self) -> &[InterfaceId] {
        &self.leases
    }

    /// Returns the lowest address in the pool that isn't leased to an interface other than
    /// `requester`
    ///
    /// Prunes stale leases, but otherwise leaves the pool untouched: the address is only taken
    /// after calling [`LeasePool::record`].
    pub(crate) fn next_free(
        &mut self,
        requester: InterfaceId,
        interfaces: &[Interface],
    ) -> Result<Ipv4Addr, NetworkError> {
        self.prune(interfaces);

        let taken: BTreeSet<u32> = self
            .leases
            .iter()
            .filter(|&&id| id != requester)
            .filter_map(|id| interfaces[id.0].address)
            .map(|address| address.to_bits())
            .collect();

        (self.start.to_bits()..=self.end_inclusive.to_bits())
            .find(|candidate| !taken.contains(candidate))
            .map(Ipv4Addr::from_bits)
            .ok_or(NetworkError::DuplicateAddress {
                start: self.start,
                end: self.end_inclusive,
            })
    }

    /// Records a lease for an interface that was just assigned an address from this pool
    pub(crate) fn record(&mut self, interface: InterfaceId, interfaces: &[Interface]) {
        self.leases.retain(|&id| id != interface);
        self.leases.push(interface);
        self.leases
            .sort_by_key(|id| interfaces[id.0].address.map(|a| a.to_bits()));
    }

    pub(crate) fn release(&mut self, address: Ipv4Addr, interfaces: &[Interface]) {
        self.prune(interfaces);
        self.leases
            .retain(|id| interfaces[id.0].address != Some(address));
    }

    fn prune(&mut self, interfaces: &[Interface]) {
        self.leases.retain(|id| interfaces[id.0].address.is_some());
    }
}
