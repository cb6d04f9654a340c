//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Entry, EntryKind)
//! - Domain value objects (Code, Identity, PairKey, SlotStatus)
//! - Domain services (CodeGenerator)
//! - Repository traits (CodeRegistry, IdentityRepository)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
