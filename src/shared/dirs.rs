use std::path::PathBuf;

/// Returns the user's home directory from the HOME environment variable.
pub fn home_dir() -> Option<PathBuf> {
    non_empty_env("HOME").map(PathBuf::from)
}

/// Returns the XDG config directory (~/.config or $XDG_CONFIG_HOME).
/// Empty values are treated as unset per XDG Base Directory Specification.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(xdg) = non_empty_env("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    home_dir().map(|home| home.join(".config"))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
