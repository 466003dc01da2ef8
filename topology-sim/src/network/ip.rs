use crate::network::error::NetworkError;
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Parses a dotted-quad IPv4 literal
pub fn parse_address(s: &str) -> Result<Ipv4Addr, NetworkError> {
    s.trim()
        .parse()
        .map_err(|_| NetworkError::MalformedAddress {
            literal: s.to_string(),
        })
}

/// Parses a network in CIDR syntax (e.g. 10.0.0.0/24)
pub fn parse_network(cidr: &str) -> Result<Ipv4Network, NetworkError> {
    cidr.parse()
}

/// An IPv4 network, always stored with its host bits cleared
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ipv4Network {
    base: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Network {
    pub fn new(address: Ipv4Addr, prefix: u8) -> Result<Self, NetworkError> {
        if prefix > 32 {
            return Err(NetworkError::MalformedNetwork {
                literal: format!("{address}/{prefix}"),
                reason: "network prefix cannot be higher than 32",
            });
        }

        Ok(Self {
            base: Ipv4Addr::from_bits(address.to_bits() & mask(prefix)),
            prefix,
        })
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn network_address(&self) -> Ipv4Addr {
        self.base
    }

    pub fn broadcast_address(&self) -> Ipv4Addr {
        Ipv4Addr::from_bits(self.base.to_bits() | !mask(self.prefix))
    }

    /// Whether the address belongs to the block at all (network and broadcast included)
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        address.to_bits() & mask(self.prefix) == self.base.to_bits()
    }

    /// Whether the address is one of the usable host addresses of the block
    pub fn contains_host(&self, address: Ipv4Addr) -> bool {
        let (first, last) = self.host_bounds();
        (first..=last).contains(&address.to_bits())
    }

    /// The usable host addresses, in increasing order
    ///
    /// Point-to-point blocks are special: a /31 has two hosts and a /32 has a single one.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let (first, last) = self.host_bounds();
        (first..=last).map(Ipv4Addr::from_bits)
    }

    fn host_bounds(&self) -> (u32, u32) {
        let network = self.base.to_bits();
        let broadcast = self.broadcast_address().to_bits();
        if self.prefix >= 31 {
            (network, broadcast)
        } else {
            (network + 1, broadcast - 1)
        }
    }
}

fn mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - prefix as u32).unwrap_or(0)
}

impl Display for Ipv4Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}

impl FromStr for Ipv4Network {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| NetworkError::MalformedNetwork {
            literal: s.to_string(),
            reason,
        };

        let mut parts = s.trim().split('/');
        let base_ip: Ipv4Addr = parts
            .next()
            .ok_or(malformed("empty string"))?
            .parse()
            .map_err(|_| malformed("invalid ip address in network"))?;

        // A missing network prefix is interpreted as /32 (i.e. a single address)
        let network_prefix: u8 = parts
            .next()
            .unwrap_or("32")
            .parse()
            .map_err(|_| malformed("the network prefix is not a valid unsigned integer"))?;
        if network_prefix > 32 {
            return Err(malformed("network prefix cannot be higher than 32"));
        }

        if parts.next().is_some() {
            return Err(malformed("network contains trailing characters"));
        }

        Self::new(base_ip, network_prefix)
    }
}

#[test]
fn test_network_parsing() {
    let cases = [
        ("10.0.0.0/24", "10.0.0.0", "10.0.0.255"),
        ("10.0.0.123/24", "10.0.0.0", "10.0.0.255"),
        ("10.0.0.0/8", "10.0.0.0", "10.255.255.255"),
        ("20.0.0.0/12", "20.0.0.0", "20.15.255.255"),
        ("192.168.1.77", "192.168.1.77", "192.168.1.77"),
        ("0.0.0.0/0", "0.0.0.0", "255.255.255.255"),
    ];

    for (input, network, broadcast) in cases {
        let parsed = parse_network(input).unwrap();
        assert_eq!(parsed.network_address().to_string(), network);
        assert_eq!(parsed.broadcast_address().to_string(), broadcast);
    }
}

#[test]
fn test_malformed_literals() {
    use crate::network::error::ErrorKind;

    for input in ["", "10.0.0/24", "10.0.0.0/33", "10.0.0.0/x", "10.0.0.0/24/1"] {
        let err = parse_network(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidNetworkConfig, "{input}");
    }

    for input in ["", "192.168.1", "192.168.1.256", "::1", "host.local"] {
        let err = parse_address(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress, "{input}");
    }
}

#[test]
fn test_contains_host() {
    let networks = ["192.168.1.0/24", "10.0.0.0/30", "172.16.0.0/20"];
    for network in networks {
        let network = parse_network(network).unwrap();
        let hosts: Vec<_> = network.hosts().collect();
        assert!(!hosts.is_empty());
        for host in &hosts {
            assert!(network.contains_host(*host));
        }

        assert!(!network.contains_host(network.network_address()));
        assert!(!network.contains_host(network.broadcast_address()));
        assert!(network.contains(network.broadcast_address()));
    }

    let lan = parse_network("192.168.1.0/24").unwrap();
    assert_eq!(lan.hosts().count(), 254);
    assert!(!lan.contains_host(parse_address("192.168.2.1").unwrap()));

    let point_to_point = parse_network("10.0.0.0/31").unwrap();
    assert_eq!(point_to_point.hosts().count(), 2);
    let single = parse_network("10.0.0.9/32").unwrap();
    assert_eq!(single.hosts().collect::<Vec<_>>(), vec![Ipv4Addr::new(10, 0, 0, 9)]);
}
