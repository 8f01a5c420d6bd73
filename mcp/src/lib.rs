// MCP server side of the UNHCR demographics integration:
// - Request dispatch (listTools / callTool)
// - Line-oriented stdio and WebSocket transports
// - The serving loop and its shutdown signal

pub mod errors;
pub mod servers;
pub mod transport;

// Re-export main types and functions for convenience
pub use errors::{TransportError, TransportResult};
pub use servers::{DemographicsServer, TOOL_NAME};
pub use transport::{serve, Inbound, LineTransport, ServeOutcome, Transport, WebSocketTransport};
