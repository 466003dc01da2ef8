use crate::config::cli::{CliOpt, Command};
use crate::config::load_topology_config;
use clap::Parser;

mod config;
mod ping;
mod util;

fn main() -> anyhow::Result<()> {
    let cli_opt = CliOpt::parse();
    let topology_config = load_topology_config(&cli_opt.topology)?;

    match &cli_opt.command {
        Command::Ping(ping_opt) => ping::run(&cli_opt, ping_opt, topology_config),
    }
}
