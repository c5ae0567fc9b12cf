//! Change request review commands.

pub mod browse;
pub mod checks;
pub mod comments;
mod common;
pub mod diff;
mod error;
pub mod files;
pub mod models;
pub mod patchsets;
pub mod review;
pub mod threads;
mod watch;

use clap::Subcommand;

use crate::shared::config::Config;

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum PrCommands {
    /// List patchsets and the suggested diff range
    Patchsets(patchsets::PatchsetsArgs),

    /// Show changed files, a directory tree, or the unified patch
    Diff(diff::DiffArgs),

    /// List changed files
    Files(files::FilesArgs),

    /// List comments
    Comments(comments::CommentsArgs),

    /// Show comments grouped into discussion threads
    Threads(threads::ThreadsArgs),

    /// Show CI checks and review status
    Checks(checks::ChecksArgs),

    /// Approve, request changes, or comment
    Review(review::ReviewArgs),

    /// Open the change request in a web browser
    Browse(browse::BrowseArgs),
}

impl PrCommands {
    pub async fn run(&self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Patchsets(args) => patchsets::run(args, config).await,
            Self::Diff(args) => diff::run(args, config).await,
            Self::Files(args) => files::run(args, config).await,
            Self::Comments(args) => comments::run(args, config).await,
            Self::Threads(args) => threads::run(args, config).await,
            Self::Checks(args) => checks::run(args, config).await,
            Self::Review(args) => review::run(args, config).await,
            Self::Browse(args) => browse::run(args, config).await,
        }
    }
}
