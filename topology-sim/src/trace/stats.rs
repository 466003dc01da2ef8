use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct NetworkStats {
    pub by_interface: HashMap<Arc<str>, InterfaceStats>,
    pub by_link: HashMap<Arc<str>, LinkStats>,
}

#[derive(Default)]
pub struct LinkStats {
    pub carried: PacketStats,
    /// Sum of the transmit times of every packet carried by the link
    pub busy_time: Duration,
}

#[derive(Default)]
pub struct InterfaceStats {
    pub sent: PacketStats,
    pub forwarded: PacketStats,
    pub received: PacketStats,
    pub dropped: u64,
}

#[derive(Default)]
pub struct PacketStats {
    pub packets: u64,
    pub bytes: usize,
}

impl PacketStats {
    pub fn track_one(&mut self, size_bytes: usize) {
        self.packets += 1;
        self.bytes += size_bytes;
    }
}
