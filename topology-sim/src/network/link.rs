use crate::network::error::NetworkError;
use crate::network::interface::InterfaceId;
use crate::network::packet::Packet;
use crate::network::spec::{InterfaceKind, LinkProfile, LinkProfiles};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Wired,
    Optical,
    Wireless,
    /// Uplink towards an unmanaged Internet interface
    Public,
}

impl LinkKind {
    /// Selects the kind of link created when `source` connects to `peer`
    ///
    /// A public peer always results in a public link, regardless of the source's medium. A public
    /// source has no medium of its own, so it also results in a public link.
    pub fn between(source: InterfaceKind, peer: InterfaceKind) -> LinkKind {
        match (source, peer) {
            (_, InterfaceKind::Public) | (InterfaceKind::Public, _) => LinkKind::Public,
            (InterfaceKind::Copper, _) => LinkKind::Wired,
            (InterfaceKind::Optical, _) => LinkKind::Optical,
            (InterfaceKind::Wireless, _) => LinkKind::Wireless,
        }
    }

    pub fn profile(self, profiles: &LinkProfiles) -> LinkProfile {
        match self {
            LinkKind::Wired => profiles.copper,
            LinkKind::Optical | LinkKind::Public => profiles.optical,
            LinkKind::Wireless => profiles.wireless,
        }
    }
}

impl Display for LinkKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LinkKind::Wired => "wired",
            LinkKind::Optical => "optical",
            LinkKind::Wireless => "wireless",
            LinkKind::Public => "public",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub(crate) id: LinkId,
    pub(crate) name: Arc<str>,
    pub(crate) endpoints: [InterfaceId; 2],
    pub(crate) kind: LinkKind,
    pub(crate) latency: Duration,
    pub(crate) bandwidth_bps: u64,
}

impl Link {
    pub(crate) fn new(
        id: LinkId,
        name: Arc<str>,
        endpoints: [InterfaceId; 2],
        kind: LinkKind,
        profiles: &LinkProfiles,
    ) -> Self {
        let profile = kind.profile(profiles);
        Self {
            id,
            name,
            endpoints,
            kind,
            latency: profile.latency,
            bandwidth_bps: profile.bandwidth_bps,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn endpoints(&self) -> [InterfaceId; 2] {
        self.endpoints
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn bandwidth_bps(&self) -> u64 {
        self.bandwidth_bps
    }

    pub fn is_public(&self) -> bool {
        self.kind == LinkKind::Public
    }

    /// Time needed to get the packet across: the link's latency plus the serialization delay
    pub fn transmit(&self, packet: &Packet) -> Duration {
        let bits = packet.size_bits() as u128;
        let serialization_ns = (bits * 1_000_000_000)
            .checked_div(self.bandwidth_bps as u128)
            .unwrap_or(u128::MAX);

        self.latency
            .saturating_add(Duration::from_nanos(u64::try_from(serialization_ns).unwrap_or(u64::MAX)))
    }

    /// Returns the endpoint at the other side of the link, as seen from `departing`
    pub(crate) fn other_end(
        &self,
        departing: InterfaceId,
        departing_name: &Arc<str>,
    ) -> Result<InterfaceId, NetworkError> {
        match self.endpoints {
            [a, b] if a == departing => Ok(b),
            [a, b] if b == departing => Ok(a),
            _ => Err(NetworkError::NextHopResolution {
                link: self.name.clone(),
                interface: departing_name.clone(),
            }),
        }
    }
}
