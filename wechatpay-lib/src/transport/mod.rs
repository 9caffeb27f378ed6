//! HTTP transport abstraction.
//!
//! The signing and verification core never talks to the network itself.
//! Every call goes through an injected [`HttpTransport`], whose own timeout
//! policy governs both foreground requests and certificate refreshes.

mod traits;

#[cfg(feature = "http-client")]
mod reqwest_transport;

pub use traits::{HttpRequest, HttpResponse, HttpTransport};

#[cfg(feature = "http-client")]
pub use reqwest_transport::ReqwestTransport;
