use crate::network::error::NetworkError;
use crate::network::ip::Ipv4Network;
use crate::network::lease::LeasePoolId;
use crate::network::link::LinkId;
use crate::network::spec::{InterfaceKind, InterfaceSpec};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub(crate) usize);

/// A network interface card, addressable through a single IPv4 address
#[derive(Clone)]
pub struct Interface {
    pub(crate) id: InterfaceId,
    pub(crate) name: Arc<str>,
    pub(crate) kind: InterfaceKind,
    pub(crate) address: Option<Ipv4Addr>,
    pub(crate) network: Option<Ipv4Network>,
    pub(crate) gateway: Option<Ipv4Addr>,
    pub(crate) lease_pool: Option<LeasePoolId>,
    /// Direct connections, keyed by the interface at the other side
    pub(crate) links: BTreeMap<InterfaceId, LinkId>,
}

impl Interface {
    pub(crate) fn new(
        id: InterfaceId,
        name: Arc<str>,
        spec: InterfaceSpec,
    ) -> Result<Self, NetworkError> {
        let mut interface = Self {
            id,
            name,
            kind: spec.kind,
            address: None,
            network: None,
            gateway: None,
            lease_pool: spec.lease_pool,
            links: BTreeMap::new(),
        };

        // The order matters: addresses are validated against the network
        if let Some(network) = spec.network {
            interface.set_network(network)?;
        }
        if let Some(gateway) = spec.gateway {
            interface.set_gateway(gateway)?;
        }
        if let Some(address) = spec.address {
            interface.set_address(address)?;
        }

        Ok(interface)
    }

    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    pub fn network(&self) -> Option<Ipv4Network> {
        self.network
    }

    pub fn gateway(&self) -> Option<Ipv4Addr> {
        self.gateway
    }

    pub fn lease_pool(&self) -> Option<LeasePoolId> {
        self.lease_pool
    }

    /// Public interfaces live outside of any simulated LAN and are exempt from network checks
    pub fn is_public(&self) -> bool {
        self.kind == InterfaceKind::Public
    }

    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    /// The interfaces directly connected to this one, together with the link leading to them
    pub fn peers(&self) -> impl Iterator<Item = (InterfaceId, LinkId)> + '_ {
        self.links.iter().map(|(peer, link)| (*peer, *link))
    }

    pub fn link_to(&self, peer: InterfaceId) -> Option<LinkId> {
        self.links.get(&peer).copied()
    }

    /// Whether the address is a host of this interface's network
    pub fn is_local(&self, address: Ipv4Addr) -> Result<bool, NetworkError> {
        let network = self.network.ok_or_else(|| NetworkError::NoNetworkConfigured {
            interface: self.name.clone(),
        })?;
        Ok(network.contains_host(address))
    }

    /// Whether this interface is the gateway of its own network
    pub fn is_gateway(&self) -> Result<bool, NetworkError> {
        match (self.address, self.gateway) {
            (Some(address), Some(gateway)) => Ok(address == gateway),
            _ => Err(NetworkError::NoAddressAssigned {
                interface: self.name.clone(),
            }),
        }
    }

    /// Moves the interface to another network
    ///
    /// Fails without changing anything if the current address or gateway would fall outside of
    /// the new network.
    pub fn set_network(&mut self, network: Ipv4Network) -> Result<(), NetworkError> {
        for assigned in [self.address, self.gateway].into_iter().flatten() {
            self.check_host(Some(network), assigned)?;
        }

        self.network = Some(network);
        Ok(())
    }

    pub fn set_address(&mut self, address: Ipv4Addr) -> Result<(), NetworkError> {
        self.check_host(self.network, address)?;
        self.address = Some(address);
        Ok(())
    }

    pub fn set_gateway(&mut self, gateway: Ipv4Addr) -> Result<(), NetworkError> {
        self.check_host(self.network, gateway)?;
        self.gateway = Some(gateway);
        Ok(())
    }

    /// Forgets the address, gateway and network of this interface
    pub(crate) fn reset_addressing(&mut self) {
        self.address = None;
        self.gateway = None;
        self.network = None;
    }

    /// Checks that `address` may be assigned to this interface if it were part of `network`
    pub(crate) fn check_host(
        &self,
        network: Option<Ipv4Network>,
        address: Ipv4Addr,
    ) -> Result<(), NetworkError> {
        if self.is_public() {
            return Ok(());
        }

        let Some(network) = network else {
            return Err(NetworkError::NoNetworkConfigured {
                interface: self.name.clone(),
            });
        };

        if !network.contains_host(address) {
            return Err(NetworkError::AddressOutsideNetwork { address, network });
        }

        Ok(())
    }
}

impl Debug for Interface {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.address {
            Some(address) => write!(f, "interface {} ({address})", self.name),
            None => write!(f, "interface {} (unassigned)", self.name),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::network::error::ErrorKind;
    use crate::network::ip::{parse_address, parse_network};

    fn spec(kind: InterfaceKind, address: &str, network: Option<&str>) -> InterfaceSpec {
        InterfaceSpec {
            address: Some(parse_address(address).unwrap()),
            network: network.map(|n| parse_network(n).unwrap()),
            ..InterfaceSpec::new(kind)
        }
    }

    #[test]
    fn test_address_must_be_within_network() {
        let ok = Interface::new(
            InterfaceId(0),
            "eth0".into(),
            spec(InterfaceKind::Copper, "192.168.1.2", Some("192.168.1.0/24")),
        )
        .unwrap();
        assert_eq!(ok.address(), Some(Ipv4Addr::new(192, 168, 1, 2)));
        assert!(ok.is_local(Ipv4Addr::new(192, 168, 1, 200)).unwrap());
        assert!(!ok.is_local(Ipv4Addr::new(10, 0, 0, 1)).unwrap());

        let outside = Interface::new(
            InterfaceId(0),
            "eth0".into(),
            spec(InterfaceKind::Copper, "10.0.0.2", Some("192.168.1.0/24")),
        )
        .unwrap_err();
        assert_eq!(outside.kind(), ErrorKind::InvalidAddress);

        let broadcast = Interface::new(
            InterfaceId(0),
            "eth0".into(),
            spec(InterfaceKind::Wireless, "192.168.1.255", Some("192.168.1.0/24")),
        )
        .unwrap_err();
        assert_eq!(broadcast.kind(), ErrorKind::InvalidAddress);

        let no_network = Interface::new(
            InterfaceId(0),
            "eth0".into(),
            spec(InterfaceKind::Copper, "192.168.1.2", None),
        )
        .unwrap_err();
        assert_eq!(no_network.kind(), ErrorKind::InvalidNetworkConfig);
    }

    #[test]
    fn test_public_interface_skips_validation() {
        let public = Interface::new(
            InterfaceId(0),
            "pub0".into(),
            spec(InterfaceKind::Public, "1.1.1.1", None),
        )
        .unwrap();
        assert!(public.is_public());
        assert_eq!(public.address(), Some(Ipv4Addr::new(1, 1, 1, 1)));
        assert!(!public.is_connected());
    }

    #[test]
    fn test_gateway_is_validated_and_stored_separately() {
        let mut interface = Interface::new(
            InterfaceId(0),
            "eth0".into(),
            spec(InterfaceKind::Copper, "192.168.1.1", Some("192.168.1.0/24")),
        )
        .unwrap();
        assert_eq!(interface.is_gateway().unwrap_err().kind(), ErrorKind::NoAddressAssigned);

        interface.set_gateway(Ipv4Addr::new(192, 168, 1, 1)).unwrap();
        assert!(interface.is_gateway().unwrap());
        assert_eq!(interface.address(), Some(Ipv4Addr::new(192, 168, 1, 1)));

        let err = interface.set_gateway(Ipv4Addr::new(8, 8, 8, 8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
        assert_eq!(interface.gateway(), Some(Ipv4Addr::new(192, 168, 1, 1)));

        interface.reset_addressing();
        assert_eq!(interface.address(), None);
        assert_eq!(interface.gateway(), None);
        assert_eq!(interface.network(), None);
    }

    #[test]
    fn test_network_change_keeps_addressing_valid() {
        let mut interface = Interface::new(
            InterfaceId(0),
            "eth0".into(),
            spec(InterfaceKind::Copper, "192.168.1.2", Some("192.168.1.0/24")),
        )
        .unwrap();
        let lan = interface.network();

        let err = interface
            .set_network(parse_network("10.0.0.0/24").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            NetworkError::AddressOutsideNetwork {
                address: Ipv4Addr::new(192, 168, 1, 2),
                network: parse_network("10.0.0.0/24").unwrap(),
            }
        );
        assert_eq!(interface.network(), lan);
        assert_eq!(interface.address(), Some(Ipv4Addr::new(192, 168, 1, 2)));

        // The gateway is checked too
        interface.set_gateway(Ipv4Addr::new(192, 168, 1, 9)).unwrap();
        let err = interface
            .set_network(parse_network("192.168.1.0/29").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
        assert_eq!(interface.network(), lan);

        // Shrinking the network is fine as long as everything still fits
        interface
            .set_network(parse_network("192.168.1.0/28").unwrap())
            .unwrap();
        assert_eq!(interface.network(), Some(parse_network("192.168.1.0/28").unwrap()));

        // Public interfaces don't belong to a LAN
        let mut public = Interface::new(
            InterfaceId(1),
            "pub0".into(),
            spec(InterfaceKind::Public, "1.1.1.1", None),
        )
        .unwrap();
        public
            .set_network(parse_network("10.0.0.0/24").unwrap())
            .unwrap();
    }
}
