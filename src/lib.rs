//! Wicket - a small threaded HTTP/1.x file server
//!
//! Core library for request parsing, connection queueing and the worker pool.

pub mod config;
pub mod http;
pub mod server;
