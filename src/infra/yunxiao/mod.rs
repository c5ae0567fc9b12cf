//! Yunxiao (Codeup) OpenAPI client.
//!
//! `CodeupClient` is the seam the review commands depend on;
//! `YunxiaoClient` is the reqwest-backed implementation.

mod change_request;
mod client;
pub(crate) mod error;
#[cfg(test)]
pub mod mock;

#[cfg(test)]
pub use change_request::mock::MockCodeupClient;
pub use change_request::{CodeupClient, CommentQuery};
pub use client::YunxiaoClient;
pub use error::YunxiaoError;
