use clap::{Parser, Subcommand};
use std::path::PathBuf;
use topology_sim::network::ping::DEFAULT_MAX_HOPS;

#[derive(Parser, Debug, Clone)]
pub struct CliOpt {
    /// Path to the JSON file describing the interfaces, lease pools and connections
    #[arg(long)]
    pub topology: PathBuf,

    /// The random seed used to generate packet ids, which you can control to get reproducible
    /// replay logs
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ping one or more addresses from an interface
    Ping(PingOpt),
}

#[derive(Parser, Debug, Clone)]
pub struct PingOpt {
    /// The name of the interface sending the pings
    #[arg(long)]
    pub from: String,

    /// The address to ping (can be provided multiple times)
    #[arg(long, required = true)]
    pub to: Vec<String>,

    /// The number of links a ping may traverse before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_HOPS)]
    pub max_hops: u32,
}
