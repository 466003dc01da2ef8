use crate::config::cli::{CliOpt, PingOpt};
use crate::config::topology::TopologyJson;
use crate::util::{print_interface_stats, print_link_stats, print_topology};
use anyhow::Context as _;
use fastrand::Rng;
use std::fs;
use std::sync::Arc;
use topology_sim::network::ping::PingOptions;
use topology_sim::trace::tracer::SimulationStepTracer;

pub fn run(cli_opt: &CliOpt, ping_opt: &PingOpt, topology_config: TopologyJson) -> anyhow::Result<()> {
    let tracer = Arc::new(SimulationStepTracer::new());
    let loaded = topology_config
        .build(tracer.clone(), Rng::with_seed(cli_opt.seed))
        .context("failed to build topology")?;
    let topology = &loaded.topology;

    print_topology(topology, &loaded.lease_pools);

    println!("--- Ping ---");
    let source = topology
        .interface_by_name(&ping_opt.from)
        .with_context(|| format!("unknown interface `{}`", ping_opt.from))?;
    let options = PingOptions {
        max_hops: ping_opt.max_hops,
    };

    let mut failed = 0;
    for destination in &ping_opt.to {
        match topology.ping_with(source.id(), destination, options) {
            Ok(report) => println!(
                "* {} -> {}: {:.3}ms ({} hops)",
                source.name(),
                report.destination,
                report.elapsed_ms(),
                report.hops
            ),
            Err(e) => {
                failed += 1;
                println!("* {} -> {destination}: FAILED ({e})", source.name());
            }
        }
    }
    println!(
        "* {} pings succeeded, {failed} failed",
        ping_opt.to.len() - failed
    );

    let stats = tracer.stats();
    print_interface_stats(&stats);
    print_link_stats(&stats, topology);

    println!("--- Replay log ---");
    let replay_log_path = "replay-log.json";
    let json_steps = serde_json::to_vec_pretty(&tracer.stepper().steps())
        .context("failed to serialize replay log")?;
    fs::write(replay_log_path, json_steps).context("failed to store replay log")?;
    println!("* Replay log available at {replay_log_path}");

    Ok(())
}
