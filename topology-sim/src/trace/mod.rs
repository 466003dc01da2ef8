//! Replay log of simulated packets

pub mod simulation_step;
pub mod simulation_stepper;
pub mod stats;
pub mod tracer;
