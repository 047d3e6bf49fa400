//! Native client layer for the ClassWeaver teaching pipeline backend.
//!
//! The heart of the crate is [`http::ApiClient`], the authenticated request
//! pipeline: it injects default headers, attaches the anti-forgery token on
//! mutating requests, and normalizes every failure into
//! [`classweaver_core::WeaverError`]. [`session::SessionService`] wraps the
//! auth endpoints to maintain the single process-wide session state, and
//! [`api`] exposes one typed wrapper per backend endpoint.

pub mod api;
pub mod config;
pub mod cookie;
pub mod csrf;
pub mod http;
pub mod session;

pub use config::ClientConfig;
pub use http::{ApiClient, RequestOptions};
pub use session::{AuthBackend, SessionService};
