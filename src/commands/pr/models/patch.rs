//! Per-file sections of a unified diff.

use lazy_regex::regex_captures;

use super::snapshot::path_matches;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSection {
    pub path: Option<String>,
    pub text: String,
}

fn header_path(rest: &str) -> Option<String> {
    let path = rest.split('\t').next().unwrap_or(rest).trim();
    if path == "/dev/null" || path.is_empty() {
        return None;
    }
    let path = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    Some(path.to_string())
}

fn git_header_path(line: &str) -> Option<String> {
    let rest = line.strip_prefix("diff --git ")?;
    let (_, new) = rest.rsplit_once(" b/")?;
    Some(new.to_string())
}

/// Old and new line counts from a `@@ -a,b +c,d @@` hunk header.
fn hunk_counts(line: &str) -> Option<(usize, usize)> {
    let (_, old, new) = regex_captures!(r"^@@ -\d+(?:,(\d+))? \+\d+(?:,(\d+))? @@", line)?;
    let count = |s: &str| if s.is_empty() { Some(1) } else { s.parse().ok() };
    Some((count(old)?, count(new)?))
}

#[derive(Default)]
struct Splitter {
    sections: Vec<PatchSection>,
    current: Option<PatchSection>,
    header_done: bool,
    old_path: Option<String>,
    old_remaining: usize,
    new_remaining: usize,
}

impl Splitter {
    fn start(&mut self, path: Option<String>) {
        if let Some(done) = self.current.take() {
            self.sections.push(done);
        }
        self.current = Some(PatchSection {
            path,
            text: String::new(),
        });
        self.header_done = false;
        self.old_path = None;
    }

    fn push(&mut self, line: &str) {
        let trimmed = line.trim_end_matches(['\n', '\r']);

        if self.old_remaining > 0 || self.new_remaining > 0 {
            match trimmed.chars().next() {
                Some('-') => self.old_remaining = self.old_remaining.saturating_sub(1),
                Some('+') => self.new_remaining = self.new_remaining.saturating_sub(1),
                Some('\\') => {}
                _ => {
                    self.old_remaining = self.old_remaining.saturating_sub(1);
                    self.new_remaining = self.new_remaining.saturating_sub(1);
                }
            }
        } else if trimmed.starts_with("diff --git ") {
            self.start(git_header_path(trimmed));
        } else if let Some(rest) = trimmed.strip_prefix("--- ") {
            if self.current.is_none() || self.header_done {
                self.start(None);
            }
            self.old_path = header_path(rest);
        } else if let Some(rest) = trimmed.strip_prefix("+++ ")
            && !self.header_done
        {
            self.header_done = true;
            let path = header_path(rest).or_else(|| self.old_path.clone());
            if let Some(section) = self.current.as_mut()
                && path.is_some()
            {
                section.path = path;
            }
        } else if let Some((old, new)) = hunk_counts(trimmed) {
            self.old_remaining = old;
            self.new_remaining = new;
        }

        self.current
            .get_or_insert_with(|| PatchSection {
                path: None,
                text: String::new(),
            })
            .text
            .push_str(line);
    }

    fn finish(mut self) -> Vec<PatchSection> {
        if let Some(done) = self.current.take() {
            self.sections.push(done);
        }
        self.sections
    }
}

/// Split a unified diff into per-file sections. Hunk line counts are
/// honored, so removed lines beginning with `--` stay in their hunk.
pub fn split_sections(patch: &str) -> Vec<PatchSection> {
    let mut splitter = Splitter::default();
    for line in patch.split_inclusive('\n') {
        splitter.push(line);
    }
    splitter.finish()
}

/// Keep only sections whose path matches one of `filters`.
pub fn filter_patch(patch: &str, filters: &[String]) -> String {
    if filters.is_empty() {
        return patch.to_string();
    }
    split_sections(patch)
        .into_iter()
        .filter(|section| {
            section
                .path
                .as_deref()
                .is_some_and(|path| filters.iter().any(|f| path_matches(path, f)))
        })
        .map(|section| section.text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use rstest::rstest;

    const GIT_PATCH: &str = indoc! {"
        diff --git a/src/a.rs b/src/a.rs
        index 111..222 100644
        --- a/src/a.rs
        +++ b/src/a.rs
        @@ -1 +1 @@
        -old
        +new
        diff --git a/docs/b.md b/docs/b.md
        --- a/docs/b.md
        +++ b/docs/b.md
        @@ -1 +1 @@
        -x
        +y
    "};

    const PLAIN_PATCH: &str = indoc! {"
        --- a/one.rs
        +++ b/one.rs
        @@ -1,2 +1 @@
        --- looks like a header
        -second
        +added
        --- a/two.rs
        +++ /dev/null
        @@ -1 +0,0 @@
        -gone
    "};

    fn paths(patch: &str) -> Vec<Option<String>> {
        split_sections(patch).into_iter().map(|s| s.path).collect()
    }

    #[test]
    fn splits_git_sections() {
        assert_eq!(
            paths(GIT_PATCH),
            vec![Some("src/a.rs".to_string()), Some("docs/b.md".to_string())]
        );
    }

    #[test]
    fn sections_reassemble_to_input() {
        for patch in [GIT_PATCH, PLAIN_PATCH] {
            let joined: String = split_sections(patch).into_iter().map(|s| s.text).collect();
            assert_eq!(joined, patch);
        }
    }

    #[test]
    fn removed_dash_lines_stay_in_hunk() {
        assert_eq!(
            paths(PLAIN_PATCH),
            vec![Some("one.rs".to_string()), Some("two.rs".to_string())]
        );
    }

    #[rstest]
    #[case::both("@@ -1,4 +1,5 @@ fn main()", Some((4, 5)))]
    #[case::implicit_one("@@ -3 +3 @@", Some((1, 1)))]
    #[case::empty_new("@@ -1 +0,0 @@", Some((1, 0)))]
    #[case::not_hunk("@@ nonsense", None)]
    fn test_hunk_counts(#[case] line: &str, #[case] expected: Option<(usize, usize)>) {
        assert_eq!(hunk_counts(line), expected);
    }

    #[test]
    fn filter_keeps_matching_sections() {
        let filtered = filter_patch(GIT_PATCH, &["b.md".to_string()]);
        assert!(filtered.starts_with("diff --git a/docs/b.md"));
        assert!(!filtered.contains("src/a.rs"));
    }

    #[test]
    fn filter_without_paths_is_identity() {
        assert_eq!(filter_patch(PLAIN_PATCH, &[]), PLAIN_PATCH);
    }
}
