use std::sync::Arc;
use std::time::Duration;
use topology_sim::network::Topology;
use topology_sim::network::interface::Interface;
use topology_sim::network::lease::LeasePoolId;
use topology_sim::trace::stats::NetworkStats;

pub fn print_topology(topology: &Topology, lease_pools: &[(Arc<str>, LeasePoolId)]) {
    println!("--- Topology ---");
    println!("* Interfaces:");
    for interface in topology.interfaces() {
        println!(
            "  * {} ({}): {}",
            interface.name(),
            interface.kind(),
            describe_addressing(interface)
        );
    }

    println!("* Links:");
    for link in topology.links() {
        println!(
            "  * {} ({}): {} latency, {} bps",
            link.name(),
            link.kind(),
            format_ms(link.latency()),
            link.bandwidth_bps()
        );
    }

    if !lease_pools.is_empty() {
        println!("* Lease pools:");
    }
    for (name, id) in lease_pools {
        let pool = topology.lease_pool(*id);
        let leased: Vec<_> = topology
            .leased_addresses(*id)
            .into_iter()
            .map(|address| address.to_string())
            .collect();
        let leased = if leased.is_empty() {
            "no leases".to_string()
        } else {
            leased.join(", ")
        };
        println!(
            "  * {name} ({}-{}): {leased}",
            pool.start(),
            pool.end_inclusive()
        );
    }
}

fn describe_addressing(interface: &Interface) -> String {
    let Some(address) = interface.address() else {
        return "no address".to_string();
    };

    let mut description = address.to_string();
    if let Some(network) = interface.network() {
        description.push_str(&format!(" in {network}"));
    }
    if let Some(gateway) = interface.gateway() {
        description.push_str(&format!(", gateway {gateway}"));
    }

    description
}

pub fn print_interface_stats(stats: &NetworkStats) {
    println!("--- Interface stats ---");
    let mut interface_stats: Vec<_> = stats.by_interface.iter().collect();
    interface_stats.sort_unstable_by_key(|(name, _)| *name);
    for (name, stats) in interface_stats {
        println!("* {name}:");
        println!(
            "  * Sent packets: {} ({} bytes)",
            stats.sent.packets, stats.sent.bytes
        );
        println!(
            "  * Forwarded packets: {} ({} bytes)",
            stats.forwarded.packets, stats.forwarded.bytes
        );
        println!(
            "  * Received packets: {} ({} bytes)",
            stats.received.packets, stats.received.bytes
        );
        if stats.dropped > 0 {
            println!("  * Dropped packets: {}", stats.dropped);
        }
    }
}

pub fn print_link_stats(stats: &NetworkStats, topology: &Topology) {
    if !stats.by_link.is_empty() {
        println!("--- Link stats ---");
    }
    let mut link_stats: Vec<_> = stats.by_link.iter().collect();
    link_stats.sort_unstable_by_key(|(name, _)| *name);
    for (link_name, stats) in link_stats {
        println!("* {link_name}:");
        println!(
            "|-> Carried {} packets ({} bytes)",
            stats.carried.packets, stats.carried.bytes
        );
        println!("|-> Busy for {}", format_ms(stats.busy_time));

        // Links removed by a disconnect are no longer in the topology
        if let Some(link) = topology.links().find(|l| l.name() == link_name) {
            let serialization =
                serialization_time(link.latency(), stats.carried.packets, stats.busy_time);
            println!(
                "|-> Of which serialization at {} bps: {}",
                link.bandwidth_bps(),
                format_ms(serialization)
            );
        }
    }
}

/// The part of a link's busy time that was not spent on propagation
fn serialization_time(latency: Duration, packets: u64, busy_time: Duration) -> Duration {
    let propagation_ns = latency.as_nanos().saturating_mul(u128::from(packets));
    let serialization_ns = busy_time.as_nanos().saturating_sub(propagation_ns);
    Duration::from_nanos(u64::try_from(serialization_ns).unwrap_or(u64::MAX))
}

fn format_ms(duration: Duration) -> String {
    format!("{:.3}ms", duration.as_secs_f64() * 1000.0)
}

#[test]
fn test_serialization_time() {
    let latency = Duration::from_millis(1);
    let busy_time = Duration::from_nanos(3 * 1_002_560);
    assert_eq!(
        serialization_time(latency, 3, busy_time),
        Duration::from_nanos(3 * 2_560)
    );

    // Packet counts beyond u32 neither wrap around nor overflow
    let packets = u64::from(u32::MAX) + 2;
    assert_eq!(
        serialization_time(latency, packets, Duration::from_secs(1)),
        Duration::ZERO
    );
    assert_eq!(
        serialization_time(Duration::MAX, u64::MAX, Duration::MAX),
        Duration::ZERO
    );
}
