//! Background request plumbing for storefront page controllers.
//!
//! This crate provides:
//! - `HttpRequest` / `HttpResponse` - Plain request and response values
//! - `Transport` - The seam a host (browser, Spin, tests) plugs into
//! - `FetchClient` - AJAX conventions, optional timeout, JSON decoding
//! - `MockTransport` - Scripted transport for tests and simulations

mod client;
mod mock;
mod request;
mod transport;

pub use client::*;
pub use mock::*;
pub use request::*;
pub use transport::*;
