// src/ecpp/mod.rs

pub mod bridge;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod ecpp_tools;
pub mod error;
pub mod event;
pub mod mcp_tool_protocol;
pub mod orchestrator;
pub mod remote;
pub mod session;
pub mod shell;
pub mod tool_protocol;
