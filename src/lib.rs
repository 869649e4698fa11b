//! Grid Traffic Simulation Library
//!
//! A discrete-time grid traffic simulation: one-way streets, traffic lights,
//! destinations and greedy car agents that share cells through a
//! reservation table. Rendering and transport layers sit outside this crate.

pub mod simulation;
