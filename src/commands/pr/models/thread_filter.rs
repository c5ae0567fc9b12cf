use clap::ValueEnum;

use super::snapshot::path_matches;
use super::thread::CommentThread;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ThreadSort {
    /// Most recent activity first
    #[default]
    Latest,
    /// Oldest activity first
    Oldest,
}

/// Client-side thread filters. All configured filters must match.
#[derive(Debug, Clone, Default)]
pub struct ThreadFilter {
    pub file_paths: Vec<String>,
    pub with_replies: bool,
    pub author: Option<String>,
    pub contains: Vec<String>,
    /// Epoch milliseconds; threads with older (or unknown) activity are dropped.
    pub since_ms: Option<i64>,
    pub sort: ThreadSort,
}

impl ThreadFilter {
    pub fn matches(&self, thread: &CommentThread) -> bool {
        self.matches_paths(thread)
            && (!self.with_replies || !thread.replies.is_empty())
            && self.matches_author(thread)
            && self.matches_keywords(thread)
            && self
                .since_ms
                .is_none_or(|since| thread.last_comment_ms > 0 && thread.last_comment_ms >= since)
    }

    fn matches_paths(&self, thread: &CommentThread) -> bool {
        self.file_paths.is_empty()
            || thread.comments().any(|node| {
                node.file_path.as_deref().is_some_and(|path| {
                    self.file_paths
                        .iter()
                        .any(|filter| path_matches(path, filter))
                })
            })
    }

    fn matches_author(&self, thread: &CommentThread) -> bool {
        let Some(needle) = self.author.as_deref().map(str::to_lowercase) else {
            return true;
        };
        thread.comments().any(|node| {
            node.author_candidates
                .iter()
                .chain(node.author.iter())
                .any(|candidate| candidate.to_lowercase().contains(&needle))
        })
    }

    fn matches_keywords(&self, thread: &CommentThread) -> bool {
        let keywords: Vec<String> = self
            .contains
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return true;
        }

        let text = thread
            .comments()
            .filter_map(|node| node.content.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
            .to_lowercase();
        keywords.iter().all(|keyword| text.contains(keyword))
    }

    /// Filter, then order by last activity.
    pub fn apply(&self, threads: Vec<CommentThread>) -> Vec<CommentThread> {
        let mut kept: Vec<CommentThread> = threads.into_iter().filter(|t| self.matches(t)).collect();
        kept.sort_by(|a, b| {
            let by_time = a.last_comment_ms.cmp(&b.last_comment_ms);
            let by_time = match self.sort {
                ThreadSort::Latest => by_time.reverse(),
                ThreadSort::Oldest => by_time,
            };
            by_time.then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        kept
    }
}
