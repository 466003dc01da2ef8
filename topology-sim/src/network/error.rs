use crate::network::ip::Ipv4Network;
use std::net::Ipv4Addr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("`{literal}` is not a valid IPv4 address")]
    MalformedAddress { literal: String },
    #[error("IPv4 address {address} is not a host address of network {network}")]
    AddressOutsideNetwork {
        address: Ipv4Addr,
        network: Ipv4Network,
    },
    #[error("`{literal}` is not a valid IPv4 network: {reason}")]
    MalformedNetwork {
        literal: String,
        reason: &'static str,
    },
    #[error("interface `{interface}` has no IPv4 network configured")]
    NoNetworkConfigured { interface: Arc<str> },
    #[error("an interface named `{name}` already exists")]
    DuplicateInterfaceName { name: Arc<str> },
    #[error("interface `{interface}` cannot be connected to itself")]
    SelfConnection { interface: Arc<str> },
    #[error("interface `{interface}` has no IPv4 address assigned")]
    NoAddressAssigned { interface: Arc<str> },
    #[error("no IPv4 address available in lease pool {start}-{end}")]
    DuplicateAddress { start: Ipv4Addr, end: Ipv4Addr },
    #[error("interface `{interface}` is not connected to interface `{peer}`")]
    NoNetworkConnection { interface: Arc<str>, peer: Arc<str> },
    #[error("no route found from {from} to {to}")]
    NoRouteToHost { from: Ipv4Addr, to: Ipv4Addr },
    #[error("no route found from {from} to {to}: gave up after {hops} hops")]
    HopLimitExceeded {
        from: Ipv4Addr,
        to: Ipv4Addr,
        hops: u32,
    },
    #[error("link `{link}` does not have interface `{interface}` as one of its endpoints")]
    NextHopResolution { link: Arc<str>, interface: Arc<str> },
}

/// Coarse classification of a [`NetworkError`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidAddress,
    InvalidNetworkConfig,
    NoAddressAssigned,
    DuplicateAddress,
    NoNetworkConnection,
    NoRouteToHost,
    NextHopResolution,
}

impl NetworkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetworkError::MalformedAddress { .. } | NetworkError::AddressOutsideNetwork { .. } => {
                ErrorKind::InvalidAddress
            }
            NetworkError::MalformedNetwork { .. }
            | NetworkError::NoNetworkConfigured { .. }
            | NetworkError::DuplicateInterfaceName { .. }
            | NetworkError::SelfConnection { .. } => ErrorKind::InvalidNetworkConfig,
            NetworkError::NoAddressAssigned { .. } => ErrorKind::NoAddressAssigned,
            NetworkError::DuplicateAddress { .. } => ErrorKind::DuplicateAddress,
            NetworkError::NoNetworkConnection { .. } => ErrorKind::NoNetworkConnection,
            NetworkError::NoRouteToHost { .. } | NetworkError::HopLimitExceeded { .. } => {
                ErrorKind::NoRouteToHost
            }
            NetworkError::NextHopResolution { .. } => ErrorKind::NextHopResolution,
        }
    }
}
