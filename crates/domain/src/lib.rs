//! Domain layer for mapframe
//!
//! Contains the map type catalog: geographic and projected geometry, map
//! items, query result records and domain errors. Conversions between
//! coordinate spaces are pure and never fail.

pub mod entities;
pub mod errors;
pub mod projection;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
