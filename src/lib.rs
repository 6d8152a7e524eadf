//! Terminal client for the expense tracker REST backend.
//!
//! - [`api`]: authenticated HTTP client for spends, tasks, categories and the profile
//! - [`session`]: bearer-token persistence between runs
//! - [`validate`]: form validation that runs before anything is sent
//! - [`cli`]: Ratatui front end with one view-state container per page

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod validate;

pub use api::ApiClient;
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
