//! Concrete [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations
//! and the HTTP plumbing they share with the ECPP API client.

pub mod http_pool;
pub mod ollama;
