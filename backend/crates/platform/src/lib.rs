//! Platform Crate - Technical Infrastructure
//!
//! Technical primitives the rendezvous domain builds on:
//! - Clock abstraction (wall clock in production, manual clock in tests)
//! - Uniform random strings over a fixed alphabet

pub mod clock;
pub mod random;
