use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, DurationNanoSeconds, serde_as};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationStep {
    /// Simulated time since the packet was sent
    #[serde_as(as = "DurationNanoSeconds")]
    #[serde(rename = "relative_time_ns")]
    pub relative_time: Duration,
    #[serde(flatten)]
    pub kind: SimulationStepKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "data")]
pub enum SimulationStepKind {
    /// The packet is at one of the interfaces
    PacketInInterface(GenericPacketEvent),
    /// The packet is being transferred over a link
    PacketInTransit(PacketInTransit),
    /// The packet reached the interface holding its destination address
    PacketDelivered(GenericPacketEvent),
    /// The packet was dropped because the interface had nowhere to send it
    PacketDropped(PacketDropped),
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenericPacketEvent {
    #[serde_as(as = "DisplayFromStr")]
    pub packet_id: Uuid,
    pub packet_number: u64,
    pub packet_size_bytes: usize,
    pub interface_id: Arc<str>,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PacketInTransit {
    #[serde_as(as = "DisplayFromStr")]
    pub packet_id: Uuid,
    pub packet_size_bytes: usize,
    pub interface_id: Arc<str>,
    pub link_id: Arc<str>,
    #[serde_as(as = "DurationNanoSeconds")]
    #[serde(rename = "transmit_time_ns")]
    pub transmit_time: Duration,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PacketDropped {
    #[serde_as(as = "DisplayFromStr")]
    pub packet_id: Uuid,
    pub interface_id: Arc<str>,
    pub reason: String,
}
