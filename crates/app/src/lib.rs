//! Cart service client, session and command line support for the mealcart engine.

pub mod auth;
pub mod client;
pub mod config;
pub mod observability;
pub mod paths;
pub mod render;
pub mod session;
pub mod wire;
