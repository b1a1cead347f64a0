//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod multipart;
pub mod schemas;
pub mod state;
pub mod submissions;
pub mod uploads;

pub use error::ApiResult;
