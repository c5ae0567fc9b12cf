//! Git error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not in a git repository")]
    NotInRepo,

    #[error("No remote 'origin' found")]
    NoOriginRemote,

    #[error("Could not parse Codeup URL: {0}")]
    InvalidCodeupUrl(String),

    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

pub type Result<T> = anyhow::Result<T>;
