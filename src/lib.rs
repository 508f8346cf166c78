//! URL routing on a compressed prefix tree.
//!
//! Routes are grouped in [`routing::Zone`]s that share a path prefix and
//! before/after handlers, can be scoped to hosts, and can be named for
//! reversal. [`http::dispatcher::Dispatcher`] runs matched handler chains and
//! [`http::blocking_http_server::HttpServer`] puts the whole thing on a socket.

pub mod error;
pub mod http;
mod macros;
pub mod routing;
