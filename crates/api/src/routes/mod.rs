//! HTTP route handlers

pub mod fleet;
pub mod predict;
