//! Data models shared by the gateways, stores and HTTP layer.

pub mod dictionary;
pub mod measurement;

pub use dictionary::*;
pub use measurement::*;
