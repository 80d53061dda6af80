//! Strategy Copilot — guided career strategy wizard core.

pub mod config;
pub mod error;
pub mod flow;
pub mod gateway;
