//! Application layer - Query objects and orchestration
//!
//! Contains the geocoder, search and directions query objects, the request
//! registry that tracks their lifecycle, the mapping session, and the port
//! definitions implemented by infrastructure adapters.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
