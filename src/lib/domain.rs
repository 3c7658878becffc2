//! Domain logic, independent of transports and providers

pub mod auth;
pub mod communication;
