//! HTTP transport for the notifications API.
//!
//! The [`Transport`] trait is the seam the pollers depend on;
//! [`ReqwestTransport`] is the production implementation.

pub mod client;
pub mod types;

pub use client::{DEFAULT_TIMEOUT, ReqwestTransport};
pub use types::{
    Credentials, HttpResponse, NotificationRequest, Transport, TransportError, TransportFuture,
    browser_url, notifications_url,
};
