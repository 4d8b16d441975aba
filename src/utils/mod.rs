//! Utility modules.

pub mod file;
pub mod retry;
pub mod text;

pub use file::{load_projects, parse_projects};
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry, with_retry_when};
pub use text::normalize_project_text;
