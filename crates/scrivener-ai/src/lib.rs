//! AI layer: chat-completions gateway, reply extraction, and per-operation result assembly.

pub mod assemble;
pub mod extract;
pub mod gateway;
pub mod prompts;
mod service;

#[cfg(test)]
mod testing;

pub use assemble::{RequestMeta, assemble};
pub use extract::{ExtractedRecord, extract};
pub use gateway::{GatewayClient, GatewayError, HttpTransport, RawResponse, Transport};
pub use service::{EditingService, ServiceError};
