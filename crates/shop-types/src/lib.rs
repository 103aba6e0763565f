//! shop-types: domain model and ports shared by the service, adapters and client.

pub mod domain;
pub mod ports;
