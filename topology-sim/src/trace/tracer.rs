use crate::network::error::NetworkError;
use crate::network::interface::Interface;
use crate::network::link::Link;
use crate::network::packet::Packet;
use crate::trace::simulation_step::{
    GenericPacketEvent, PacketDropped, PacketInTransit, SimulationStep, SimulationStepKind,
};
use crate::trace::simulation_stepper::SimulationStepper;
use crate::trace::stats::NetworkStats;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

/// Records what happens to every packet, so runs can be inspected and replayed afterwards
#[derive(Default)]
pub struct SimulationStepTracer {
    recorded_steps: Mutex<Vec<SimulationStep>>,
    already_warned_no_route: Mutex<HashSet<(Arc<str>, Ipv4Addr)>>,
}

impl SimulationStepTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<SimulationStep> {
        self.recorded_steps.lock().clone()
    }

    pub fn stats(&self) -> NetworkStats {
        self.stepper().simulate()
    }

    pub fn stepper(&self) -> SimulationStepper {
        let steps = self.recorded_steps.lock().clone();
        SimulationStepper::new(steps)
    }

    fn record(&self, relative_time: Duration, kind: SimulationStepKind) {
        self.recorded_steps.lock().push(SimulationStep {
            relative_time,
            kind,
        });
    }

    pub fn track_packet_in_interface(
        &self,
        elapsed: Duration,
        interface: &Interface,
        packet: &Packet,
    ) {
        self.record(
            elapsed,
            SimulationStepKind::PacketInInterface(GenericPacketEvent {
                packet_id: packet.id,
                packet_number: packet.number,
                packet_size_bytes: packet.size_bytes,
                interface_id: interface.name().clone(),
            }),
        );
    }

    pub fn track_packet_in_transit(
        &self,
        elapsed: Duration,
        interface: &Interface,
        link: &Link,
        packet: &Packet,
        transmit_time: Duration,
    ) {
        self.record(
            elapsed,
            SimulationStepKind::PacketInTransit(PacketInTransit {
                packet_id: packet.id,
                packet_size_bytes: packet.size_bytes,
                interface_id: interface.name().clone(),
                link_id: link.name().clone(),
                transmit_time,
            }),
        );
    }

    pub fn track_delivered(&self, elapsed: Duration, interface: &Interface, packet: &Packet) {
        self.record(
            elapsed,
            SimulationStepKind::PacketDelivered(GenericPacketEvent {
                packet_id: packet.id,
                packet_number: packet.number,
                packet_size_bytes: packet.size_bytes,
                interface_id: interface.name().clone(),
            }),
        );
    }

    pub fn track_dropped(
        &self,
        elapsed: Duration,
        interface: &Interface,
        packet: &Packet,
        error: &NetworkError,
    ) {
        self.record(
            elapsed,
            SimulationStepKind::PacketDropped(PacketDropped {
                packet_id: packet.id,
                interface_id: interface.name().clone(),
                reason: error.to_string(),
            }),
        );

        let first_dropped = self
            .already_warned_no_route
            .lock()
            .insert((interface.name().clone(), packet.destination));
        if first_dropped {
            println!(
                "{:.3}ms WARN packet #{} dropped by interface `{}`: {error} (Note: further warnings for this destination will be omitted to avoid cluttering the output)",
                elapsed.as_secs_f64() * 1000.0,
                packet.number,
                interface.name(),
            );
        }
    }
}
