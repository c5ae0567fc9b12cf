//! Centralized reader for the environment variables yx honors.
//!
//! Variable names are private constants here; callers read values through
//! `EnvVars`.

const TOKEN: &str = "YUNXIAO_TOKEN";
const ORGANIZATION_ID: &str = "YX_ORGANIZATION_ID";
const REPOSITORY_ID: &str = "YX_REPOSITORY_ID";
const API_BASE_URL: &str = "YX_API_BASE_URL";
const LOG: &str = "YX_LOG";

/// Snapshot of the relevant environment variables at load time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvVars {
    /// Default organization when `--org` is not given.
    pub organization_id: Option<String>,

    /// Default repository when `--repo` is not given.
    pub repository_id: Option<String>,

    /// Overrides `api.base_url` from the config file.
    pub api_base_url: Option<String>,

    /// Log filter directive (tracing-subscriber `EnvFilter` syntax).
    pub log: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

impl EnvVars {
    pub fn load() -> Self {
        Self {
            organization_id: non_empty_var(ORGANIZATION_ID),
            repository_id: non_empty_var(REPOSITORY_ID),
            api_base_url: non_empty_var(API_BASE_URL),
            log: non_empty_var(LOG),
        }
    }

    /// Default name of the token variable; `api.token_env` may point elsewhere.
    pub fn default_token_name() -> &'static str {
        TOKEN
    }

    /// Read the API token from the named variable.
    pub fn token(name: &str) -> Option<String> {
        non_empty_var(name)
    }
}
