pub mod network;
pub mod trace;
