//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod mapkit_adapter;
mod token_provider;

pub use mapkit_adapter::MapKitAdapter;
pub use token_provider::{EnvTokenProvider, StaticTokenProvider};
