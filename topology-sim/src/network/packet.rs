use std::net::Ipv4Addr;
use uuid::Uuid;

pub const PING_PACKET_SIZE: usize = 32;

#[derive(Clone, Debug)]
pub struct Packet {
    /// Unique id, used to correlate the steps of the replay log
    pub id: Uuid,
    /// Sequence number within the topology that created the packet
    pub number: u64,
    pub size_bytes: usize,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Packet {
    pub fn ping(id: Uuid, number: u64, source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            id,
            number,
            size_bytes: PING_PACKET_SIZE,
            source,
            destination,
        }
    }

    pub fn size_bits(&self) -> u64 {
        (self.size_bytes as u64).saturating_mul(8)
    }
}
