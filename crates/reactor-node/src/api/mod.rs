//! HTTP API.

pub mod element;
pub mod health;
pub mod plan;
