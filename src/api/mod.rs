//! Client for the CMS REST API.
//!
//! - [`request`] builds transport-independent request descriptors
//! - [`transport`] executes them (`reqwest` in production)
//! - [`client`] exposes one typed operation per remote resource
//! - [`error`] normalizes failures into a single message-carrying error

pub mod client;
pub mod error;
pub mod models;
pub mod request;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, Credentials};
pub use error::ApiError;
pub use models::{
    Article, ArticleInput, ArticlePatch, ArticleStatus, EntityRef, Issue, IssueInput, IssuePatch,
    LoginRequest, LoginResponse, RegisterRequest,
};
pub use request::{ApiRequest, ImageUpload, RequestBody};
pub use transport::{RawResponse, ReqwestTransport, Transport};
