use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrError {
    #[error("Change request !{0} has no patchsets; pass --to to choose a revision explicitly")]
    NoPatchsets(u64),

    #[error("Cannot determine {what}; pass {flag} explicitly")]
    MissingParameter {
        what: &'static str,
        flag: &'static str,
    },

    #[error(
        "Cannot resolve commit SHAs for patchsets {from}..{to}; pass --from/--to with patchsets that carry commit IDs"
    )]
    MissingCommit { from: String, to: String },

    #[error("Invalid --since value '{0}': expected a timestamp or a relative age like 30m, 12h, 7d")]
    InvalidSince(String),
}

pub type Result<T> = anyhow::Result<T>;
