//! Protocol message definitions

pub mod jsonrpc;
pub mod request;
pub mod response;

pub use {
    jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId},
    request::Request,
    response::Response,
};
