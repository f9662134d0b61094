//! idsnap-client — HTTP access to the IDSnap recognition service.
//!
//! Provides environment-driven [`Config`] and [`HttpFaceService`], the
//! reqwest-backed implementation of `idsnap_core::FaceService`.

pub mod config;
pub mod http;

pub use config::Config;
pub use http::HttpFaceService;
