use crate::trace::simulation_step::{SimulationStep, SimulationStepKind};
use crate::trace::stats::NetworkStats;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct SimulationStepper {
    steps: Vec<SimulationStep>,
}

impl SimulationStepper {
    pub fn new(steps: Vec<SimulationStep>) -> Self {
        Self { steps }
    }

    pub fn record(&mut self, step: SimulationStep) {
        self.steps.push(step);
    }

    pub fn steps(self) -> Vec<SimulationStep> {
        self.steps
    }

    /// The interfaces visited by the packet, with the time at which it arrived at each of them
    pub fn get_packet_hops(&self, id: Uuid) -> Vec<(Duration, Arc<str>)> {
        let mut hops = Vec::new();
        for step in &self.steps {
            match &step.kind {
                SimulationStepKind::PacketInInterface(s) if s.packet_id == id => {
                    hops.push((step.relative_time, s.interface_id.clone()));
                }
                _ => {}
            }
        }

        hops
    }

    pub fn get_packet_path(&self, id: Uuid) -> Vec<Arc<str>> {
        self.get_packet_hops(id)
            .into_iter()
            .map(|(_, interface_id)| interface_id)
            .collect()
    }

    pub fn get_packet_delivered_at(&self, packet_id: Uuid, interface_id: &str) -> Option<Duration> {
        self.steps
            .iter()
            .filter_map(|s| match &s.kind {
                SimulationStepKind::PacketDelivered(kind)
                    if kind.packet_id == packet_id && kind.interface_id.as_ref() == interface_id =>
                {
                    Some(s.relative_time)
                }
                _ => None,
            })
            .next()
    }

    /// Replays the recorded steps and aggregates them into per-interface and per-link statistics
    pub fn simulate(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();
        let mut origins: HashMap<Uuid, Arc<str>> = HashMap::new();

        for step in &self.steps {
            match &step.kind {
                SimulationStepKind::PacketInInterface(s) => {
                    origins
                        .entry(s.packet_id)
                        .or_insert_with(|| s.interface_id.clone());
                }
                SimulationStepKind::PacketInTransit(s) => {
                    let is_origin = origins
                        .get(&s.packet_id)
                        .is_some_and(|origin| *origin == s.interface_id);
                    let interface = stats.by_interface.entry(s.interface_id.clone()).or_default();
                    if is_origin {
                        interface.sent.track_one(s.packet_size_bytes);
                    } else {
                        interface.forwarded.track_one(s.packet_size_bytes);
                    }

                    let link = stats.by_link.entry(s.link_id.clone()).or_default();
                    link.carried.track_one(s.packet_size_bytes);
                    link.busy_time += s.transmit_time;
                }
                SimulationStepKind::PacketDelivered(s) => {
                    stats
                        .by_interface
                        .entry(s.interface_id.clone())
                        .or_default()
                        .received
                        .track_one(s.packet_size_bytes);
                }
                SimulationStepKind::PacketDropped(s) => {
                    stats
                        .by_interface
                        .entry(s.interface_id.clone())
                        .or_default()
                        .dropped += 1;
                }
            }
        }

        stats
    }
}
