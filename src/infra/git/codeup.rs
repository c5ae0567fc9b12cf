//! Codeup remote URL parsing.

use git2::Repository;
use lazy_regex::regex_captures;

use super::error::{GitError, Result};
use super::repo::{open_repo, origin_url};

/// Parse organization ID and repository path from a Codeup remote URL.
/// Supports SSH (`git@codeup.aliyun.com:org/group/repo.git`) and HTTPS.
pub fn parse_codeup_url(url: &str) -> Result<(String, String)> {
    let (_, org, repo) =
        regex_captures!(r"codeup\.aliyun\.com[:/]([^/]+)/(.+?)(?:\.git)?/?$", url.trim())
            .ok_or_else(|| GitError::InvalidCodeupUrl(url.to_string()))?;
    Ok((org.to_string(), repo.to_string()))
}

/// Get organization and repository from the origin remote.
pub fn codeup_org_and_repo(repo: &Repository) -> Result<(String, String)> {
    let url = origin_url(repo)?;
    parse_codeup_url(&url)
}

/// Organization and repository of the repository containing the cwd, if any.
pub fn detect_codeup_repo() -> Option<(String, String)> {
    let repo = open_repo().ok()?;
    codeup_org_and_repo(&repo).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::git::test_utils::TempRepo;
    use rstest::rstest;

    #[rstest]
    #[case::https("https://codeup.aliyun.com/org1/repo.git", "org1", "repo")]
    #[case::https_group("https://codeup.aliyun.com/org1/grp/sub/repo.git", "org1", "grp/sub/repo")]
    #[case::https_no_git("https://codeup.aliyun.com/org1/repo", "org1", "repo")]
    #[case::ssh("git@codeup.aliyun.com:org1/grp/repo.git", "org1", "grp/repo")]
    #[case::trailing_slash("https://codeup.aliyun.com/org1/repo/", "org1", "repo")]
    fn test_parse_codeup_url(
        #[case] url: &str,
        #[case] expected_org: &str,
        #[case] expected_repo: &str,
    ) {
        let (org, repo) = parse_codeup_url(url).unwrap();
        assert_eq!(org, expected_org);
        assert_eq!(repo, expected_repo);
    }

    #[rstest]
    #[case::github("https://github.com/owner/repo.git")]
    #[case::org_only("https://codeup.aliyun.com/org1")]
    #[case::invalid("not-a-url")]
    fn test_parse_codeup_url_invalid(#[case] url: &str) {
        assert!(parse_codeup_url(url).is_err());
    }

    #[test]
    fn test_codeup_org_and_repo_from_temp_repo() {
        let temp = TempRepo::new("org-9", "team/service", "main");
        let (org, repo) = codeup_org_and_repo(&temp.open()).unwrap();
        assert_eq!(org, "org-9");
        assert_eq!(repo, "team/service");
    }
}
