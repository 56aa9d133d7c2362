//! Tool-calling protocol surface: JSON-RPC envelopes, the tool catalog and the
//! dispatcher that routes calls to the right user's credential.

pub mod dispatcher;
pub mod protocol;
pub mod tools;

pub use dispatcher::Dispatcher;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpMethod, RequestId};
pub use tools::{Tool, ToolCall, ToolCallError};
