//! Infrastructure Layer
//!
//! Storage strategies behind the registry traits. Both give the same
//! atomicity guarantees; pick one at startup.

pub mod memory;
pub mod postgres;
