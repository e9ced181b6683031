//! Tracker API Client
//!
//! Thin reqwest wrapper over the dashboard backend: auth and department
//! endpoints, bearer-token injection from the stored session, and
//! normalisation of every failure into a `{message, statusCode}` pair the
//! UI can show verbatim.

mod auth;
mod client;
mod department;
mod error;

pub use auth::{ApiMessage, AuthSuccess, ForgotPasswordPayload, SignInPayload, SignUpPayload};
pub use client::ApiClient;
pub use department::{Department, DepartmentPayload};
pub use error::ApiError;

pub type Result<T> = std::result::Result<T, ApiError>;
