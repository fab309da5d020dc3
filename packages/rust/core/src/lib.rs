//! Release pipeline stages for relnotes.
//!
//! This crate ties together lockfile inspection, changelog classification,
//! runtime artifact loading and template rendering into one run
//! ([`pipeline::generate_release_text`]).

pub mod changelog;
pub mod lockfile;
pub mod pipeline;
pub mod render;
pub mod runtime;
