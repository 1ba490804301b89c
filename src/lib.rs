//! Deterministic simulation of a gut microbiome contested between commensal
//! bacteria and *C. difficile*, under antibiotic and microbiome-therapeutic
//! treatment.
//!
//! The core ([`engine`] and the models it drives) is a set of pure
//! transformations over [`model::SimulationState`]; [`session`] wraps one run
//! for callers and [`manager`] persists runs in a simulation directory.

pub mod analysis;
pub mod antibiotic;
pub mod config;
pub mod engine;
pub mod health;
pub mod manager;
pub mod model;
pub mod pathogen;
pub mod profile;
pub mod regrowth;
pub mod rng;
pub mod session;
pub mod stats;
