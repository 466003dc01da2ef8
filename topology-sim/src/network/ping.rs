//! Hop-by-hop resolution of a ping through a [`Topology`]
//!
//! At every interface the packet leaves through the first link that leads to, in order of
//! preference:
//!
//! 1. the destination itself;
//! 2. the interface's gateway;
//! 3. the public Internet.
//!
//! Any other link is ignored. There is no backtracking: if the chosen path ends in an interface
//! without a suitable link, the ping fails with [`NetworkError::NoRouteToHost`]. Misconfigured
//! gateways can make the packet go in circles, which is why every session has a hop limit.

use crate::network::Topology;
use crate::network::error::NetworkError;
use crate::network::interface::{Interface, InterfaceId};
use crate::network::ip::parse_address;
use crate::network::link::Link;
use crate::network::packet::Packet;
use std::net::Ipv4Addr;
use std::time::Duration;
use uuid::Uuid;

/// Same as the default TTL used by Linux
pub const DEFAULT_MAX_HOPS: u32 = 64;

#[derive(Copy, Clone, Debug)]
pub struct PingOptions {
    /// Number of links the packet may traverse before the ping is considered lost
    pub max_hops: u32,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PingState {
    Resolving,
    Done(Duration),
    Failed(NetworkError),
}

#[derive(Clone, Debug)]
pub struct PingReport {
    pub packet_id: Uuid,
    pub destination: Ipv4Addr,
    /// Total time needed to reach the destination
    pub elapsed: Duration,
    /// Number of links traversed
    pub hops: u32,
}

impl PingReport {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

pub struct PingSession<'a> {
    topology: &'a Topology,
    packet: Packet,
    current: InterfaceId,
    elapsed: Duration,
    hops: u32,
    max_hops: u32,
    state: PingState,
}

impl<'a> PingSession<'a> {
    pub(crate) fn new(
        topology: &'a Topology,
        source: InterfaceId,
        destination: &str,
        options: PingOptions,
    ) -> Result<Self, NetworkError> {
        let source_interface = topology.interface(source);
        let source_address =
            source_interface
                .address()
                .ok_or_else(|| NetworkError::NoAddressAssigned {
                    interface: source_interface.name().clone(),
                })?;
        let destination = parse_address(destination)?;

        let packet = topology.next_ping_packet(source_address, destination);
        topology
            .tracer()
            .track_packet_in_interface(Duration::ZERO, source_interface, &packet);

        Ok(Self {
            topology,
            packet,
            current: source,
            elapsed: Duration::ZERO,
            hops: 0,
            max_hops: options.max_hops,
            state: PingState::Resolving,
        })
    }

    pub fn state(&self) -> &PingState {
        &self.state
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// The interface the packet is currently at
    pub fn current(&self) -> InterfaceId {
        self.current
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// Moves the packet one hop further, unless resolution is already over
    pub fn step(&mut self) -> &PingState {
        if self.state != PingState::Resolving {
            return &self.state;
        }

        let topology = self.topology;
        let tracer = topology.tracer();
        let current = topology.interface(self.current);
        if current.address() == Some(self.packet.destination) {
            tracer.track_delivered(self.elapsed, current, &self.packet);
            self.state = PingState::Done(self.elapsed);
            return &self.state;
        }

        match self.next_hop(current) {
            Ok((link, next)) => {
                let transmit_time = link.transmit(&self.packet);
                tracer.track_packet_in_transit(
                    self.elapsed,
                    current,
                    link,
                    &self.packet,
                    transmit_time,
                );

                self.elapsed += transmit_time;
                self.hops += 1;
                self.current = next;

                let next = topology.interface(next);
                tracer.track_packet_in_interface(self.elapsed, next, &self.packet);
            }
            Err(e) => {
                tracer.track_dropped(self.elapsed, current, &self.packet, &e);
                self.state = PingState::Failed(e);
            }
        }

        &self.state
    }

    /// Resolves the whole path
    pub fn run(mut self) -> Result<PingReport, NetworkError> {
        loop {
            self.step();
            match &self.state {
                PingState::Resolving => {}
                PingState::Done(elapsed) => {
                    return Ok(PingReport {
                        packet_id: self.packet.id,
                        destination: self.packet.destination,
                        elapsed: *elapsed,
                        hops: self.hops,
                    });
                }
                PingState::Failed(e) => return Err(e.clone()),
            }
        }
    }

    fn next_hop(&self, current: &Interface) -> Result<(&'a Link, InterfaceId), NetworkError> {
        let departing = current
            .address()
            .ok_or_else(|| NetworkError::NoAddressAssigned {
                interface: current.name().clone(),
            })?;
        let destination = self.packet.destination;

        if self.hops >= self.max_hops {
            return Err(NetworkError::HopLimitExceeded {
                from: departing,
                to: destination,
                hops: self.hops,
            });
        }

        let topology = self.topology;
        let peer_address = |peer: InterfaceId| topology.interface(peer).address();
        let leads_to = |address: Option<Ipv4Addr>| {
            current
                .peers()
                .find(|&(peer, _)| address.is_some() && peer_address(peer) == address)
        };

        let (_, link_id) = leads_to(Some(destination))
            .or_else(|| leads_to(current.gateway()))
            .or_else(|| {
                current
                    .peers()
                    .find(|&(_, link)| topology.link(link).is_some_and(Link::is_public))
            })
            .ok_or(NetworkError::NoRouteToHost {
                from: departing,
                to: destination,
            })?;

        let link = topology
            .link(link_id)
            .ok_or_else(|| NetworkError::NextHopResolution {
                link: format!("#{}", link_id.0).into(),
                interface: current.name().clone(),
            })?;
        let next = link.other_end(current.id(), current.name())?;

        Ok((link, next))
    }
}
