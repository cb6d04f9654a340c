//! Shared Kernel
//!
//! The vocabulary every rendezvous crate agrees on:
//! - [`error::app_error::AppError`] and the [`error::app_error::AppResult`] alias
//! - [`error::kind::ErrorKind`], the outward classification of failures
//!
//! Nothing domain specific lives here. Crates keep their own error enums and
//! convert into `AppError` at the edge.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
