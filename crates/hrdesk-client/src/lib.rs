//! # hrdesk-client
//!
//! Async client for the hrdesk HR self-service backend.
//!
//! - [`api`] - REST calls, session token and error mapping
//! - [`cache`] - 24-hour download cache
//! - [`workflow`] - Leave and OD screen state: refresh, submit, approve
//! - [`models`] - Response bodies used only by the client
//! - [`logging`] - Subscriber setup for the `hrdesk` binary
//! - [`error`] - Client error type

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod api;
pub mod cache;
pub mod error;
pub mod logging;
pub mod models;
pub mod workflow;

pub use api::HrClient;
pub use cache::{CachedFile, FileCache};
pub use error::{ClientError, ClientResult};
pub use workflow::{BoardScope, LeaveBoard};
