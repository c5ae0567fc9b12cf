//! Git operations using git2 (libgit2).
//!
//! Only used to infer the Codeup organization and repository from the
//! `origin` remote when neither flags nor config provide them.

mod codeup;
mod error;
mod repo;
#[cfg(test)]
pub mod test_utils;

pub use codeup::detect_codeup_repo;
