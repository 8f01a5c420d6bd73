// Core pieces shared by the demographics MCP server:
// - Request/response data structures for the wire protocol
// - Tool argument validation
// - Configuration loading
// - Shared error types
// - Client for the UNHCR population API

// Export client module - UNHCR API client
pub mod client;
pub use client::{DemographicsClient, DemographicsSource};

// Export types module - Tool argument model
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::ServerConfig;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;

// Export wire protocol types
pub mod rpc_types;
pub use rpc_types::{
    CallToolParams, Content, ErrorObject, ListToolsResult, Method, Request, Response,
    ToolDescriptor, ToolResult,
};
