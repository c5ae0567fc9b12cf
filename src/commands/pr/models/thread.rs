//! Reconstruction of discussion threads from flat comment records.
//!
//! The comment listing endpoint is queried once per `comment_type × state`
//! combination, so the same comment can arrive several times, sometimes
//! top-level and sometimes embedded in its parent's child list, with
//! different subsets of fields populated. Records are flattened into nodes,
//! merged by ID, and grouped under the root of their parent chain.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::shared::json::{first_array, first_bool, first_str};
use crate::shared::time::{format_ms, value_to_ms};

pub const UNKNOWN_AUTHOR: &str = "(unknown)";

const ID_KEYS: &[&str] = &["comment_biz_id", "commentBizId", "id"];
const PARENT_KEYS: &[&str] = &[
    "parent_comment_biz_id",
    "parentCommentBizId",
    "parentId",
    "parent_id",
];
const CONTENT_KEYS: &[&str] = &["content", "body", "text"];
const RESOLVED_KEYS: &[&str] = &["resolved", "isResolved", "is_resolved"];
const STATE_KEYS: &[&str] = &["state", "status"];
const TYPE_KEYS: &[&str] = &["comment_type", "commentType", "type"];
const PATH_KEYS: &[&str] = &[
    "file_path",
    "filePath",
    "path",
    "location.file_path",
    "location.filePath",
    "new_path",
    "newPath",
];
const TIME_KEYS: &[&str] = &[
    "comment_time",
    "commentTime",
    "gmt_create",
    "gmtCreate",
    "create_time",
    "createTime",
    "createdAt",
];
const CHILD_KEYS: &[&str] = &[
    "child_comments_list",
    "childCommentsList",
    "children",
    "replies",
];
/// Display-name preference for the author.
const AUTHOR_NAME_KEYS: &[&str] = &[
    "author.name",
    "author.nickName",
    "author.username",
    "author.userName",
    "author_name",
    "authorName",
    "user.name",
    "user.username",
    "creator.name",
    "creator.username",
    "author.email",
    "author.userId",
    "author.id",
];
/// Every identity field the author filter may match against.
const AUTHOR_CANDIDATE_KEYS: &[&str] = &[
    "author.name",
    "author.nickName",
    "author.username",
    "author.userName",
    "author.userId",
    "author.id",
    "author.email",
    "author_name",
    "authorName",
    "author_id",
    "authorId",
    "user.name",
    "user.username",
    "user.userId",
    "user.email",
    "creator.name",
    "creator.username",
    "creator.userId",
    "creator.email",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_biz_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author_candidates: Vec<String>,
    /// Epoch milliseconds of `comment_time`; 0 when unknown.
    #[serde(skip)]
    pub time_ms: i64,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl CommentNode {
    /// Normalize one record. `inherited_parent` is the ID of the record
    /// whose child list embedded this one, used when the record names no
    /// parent itself.
    pub fn from_record(raw: &Value, inherited_parent: Option<&str>) -> Option<Self> {
        let id = first_str(raw, ID_KEYS)?;
        let time_value = TIME_KEYS.iter().find_map(|key| {
            raw.get(*key)
                .filter(|v| !v.is_null() && v.as_str().is_none_or(|s| !s.trim().is_empty()))
        });

        let mut candidates: Vec<String> = Vec::new();
        for key in AUTHOR_CANDIDATE_KEYS {
            if let Some(value) = first_str(raw, &[*key])
                && !candidates.contains(&value)
            {
                candidates.push(value);
            }
        }

        let parent = first_str(raw, PARENT_KEYS)
            .or_else(|| inherited_parent.map(str::to_string))
            .filter(|parent| *parent != id && parent != "0");

        Some(Self {
            parent_comment_biz_id: parent,
            content: first_str(raw, CONTENT_KEYS),
            resolved: first_bool(raw, RESOLVED_KEYS).unwrap_or(false),
            state: first_str(raw, STATE_KEYS),
            comment_type: first_str(raw, TYPE_KEYS),
            file_path: first_str(raw, PATH_KEYS),
            comment_time: time_value.and_then(display_time),
            author: first_str(raw, AUTHOR_NAME_KEYS),
            author_candidates: candidates,
            time_ms: time_value.and_then(value_to_ms).unwrap_or(0),
            raw: strip_children(raw),
            id,
        })
    }

    /// Fill fields this node lacks from another copy of the same comment.
    pub fn merge(&mut self, other: CommentNode) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.parent_comment_biz_id, other.parent_comment_biz_id);
        fill(&mut self.content, other.content);
        fill(&mut self.state, other.state);
        fill(&mut self.comment_type, other.comment_type);
        fill(&mut self.file_path, other.file_path);
        fill(&mut self.comment_time, other.comment_time);
        fill(&mut self.author, other.author);
        self.resolved |= other.resolved;
        if self.time_ms == 0 {
            self.time_ms = other.time_ms;
        }
        for candidate in other.author_candidates {
            if !self.author_candidates.contains(&candidate) {
                self.author_candidates.push(candidate);
            }
        }
        if self.raw.is_null() {
            self.raw = other.raw;
        }
    }

    pub fn author_or_unknown(&self) -> &str {
        self.author.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    }
}

fn display_time(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(_) => value_to_ms(value).map(format_ms),
        _ => None,
    }
}

/// The record without its embedded child list, which is flattened into
/// separate nodes.
fn strip_children(raw: &Value) -> Value {
    let mut raw = raw.clone();
    if let Some(map) = raw.as_object_mut() {
        for key in CHILD_KEYS {
            map.remove(*key);
        }
    }
    raw
}

/// The comment ID, else `content|time`. The fallback is lossy: ID-less
/// records with equal content and time (or none of either) collide.
fn dedupe_key(record: &Value) -> String {
    first_str(record, ID_KEYS).unwrap_or_else(|| {
        format!(
            "{}|{}",
            first_str(record, CONTENT_KEYS).unwrap_or_default(),
            first_str(record, TIME_KEYS).unwrap_or_default()
        )
    })
}

/// Drop repeated records, keeping the first occurrence.
pub fn dedupe_records(records: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(dedupe_key(record)))
        .collect()
}

/// Flatten records and their embedded children into nodes merged by ID.
/// The returned map preserves no order; callers sort.
pub fn collect_nodes(records: &[Value]) -> HashMap<String, CommentNode> {
    let mut nodes: HashMap<String, CommentNode> = HashMap::new();
    let mut stack: Vec<(&Value, Option<String>)> =
        records.iter().rev().map(|r| (r, None)).collect();

    while let Some((record, inherited)) = stack.pop() {
        let Some(node) = CommentNode::from_record(record, inherited.as_deref()) else {
            continue;
        };
        if let Some(children) = first_array(record, CHILD_KEYS) {
            for child in children.iter().rev() {
                stack.push((child, Some(node.id.clone())));
            }
        }
        match nodes.entry(node.id.clone()) {
            Entry::Occupied(mut existing) => existing.get_mut().merge(node),
            Entry::Vacant(slot) => {
                slot.insert(node);
            }
        }
    }
    nodes
}

/// The grouping key of a node: its root ancestor's ID, or the first parent
/// ID in the chain that was never fetched. A cycle resolves to the
/// smallest ID on it so every member lands in the same thread.
pub fn thread_key(id: &str, nodes: &HashMap<String, CommentNode>) -> String {
    let mut path: Vec<&str> = Vec::new();
    let mut current = id;

    loop {
        if let Some(start) = path.iter().position(|seen| *seen == current) {
            return path[start..]
                .iter()
                .min()
                .map_or_else(|| current.to_string(), |min| (*min).to_string());
        }
        path.push(current);

        let Some(node) = nodes.get(current) else {
            return current.to_string();
        };
        match node.parent_comment_biz_id.as_deref() {
            None => return current.to_string(),
            Some(parent) if !nodes.contains_key(parent) => return parent.to_string(),
            Some(parent) => current = parent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub thread_id: String,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub file_paths: Vec<String>,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_comment_at: Option<String>,
    /// Epoch milliseconds of the latest comment; 0 when unknown.
    #[serde(skip)]
    pub last_comment_ms: i64,
    pub total_comments: usize,
    pub root_comment: CommentNode,
    pub replies: Vec<CommentNode>,
}

impl CommentThread {
    /// All nodes, root first.
    pub fn comments(&self) -> impl Iterator<Item = &CommentNode> {
        std::iter::once(&self.root_comment).chain(self.replies.iter())
    }

    fn assemble(thread_id: String, mut members: Vec<CommentNode>) -> Option<Self> {
        if members.is_empty() {
            return None;
        }
        members.sort_by(|a, b| a.time_ms.cmp(&b.time_ms).then_with(|| a.id.cmp(&b.id)));
        let root_index = members
            .iter()
            .position(|n| n.id == thread_id)
            .unwrap_or(0);
        let root = members.remove(root_index);
        let replies = members;

        let all: Vec<&CommentNode> = std::iter::once(&root).chain(replies.iter()).collect();

        let mut file_paths: Vec<String> = Vec::new();
        let mut participants: Vec<String> = Vec::new();
        for node in &all {
            if let Some(path) = &node.file_path
                && !file_paths.contains(path)
            {
                file_paths.push(path.clone());
            }
            let author = node.author_or_unknown().to_string();
            if !participants.contains(&author) {
                participants.push(author);
            }
        }

        let latest = all
            .iter()
            .filter(|n| n.time_ms > 0)
            .max_by_key(|n| n.time_ms);

        Some(Self {
            resolved: all.iter().all(|n| n.resolved),
            comment_type: all.iter().find_map(|n| n.comment_type.clone()),
            state: all.iter().find_map(|n| n.state.clone()),
            file_paths,
            participants,
            last_comment_at: latest.and_then(|n| n.comment_time.clone()),
            last_comment_ms: latest.map_or(0, |n| n.time_ms),
            total_comments: all.len(),
            thread_id,
            root_comment: root,
            replies,
        })
    }
}

/// Build threads from raw comment records, newest activity first.
pub fn summarize_threads(records: &[Value]) -> Vec<CommentThread> {
    let nodes = collect_nodes(records);

    let mut groups: BTreeMap<String, Vec<CommentNode>> = BTreeMap::new();
    for id in nodes.keys() {
        let key = thread_key(id, &nodes);
        if let Some(node) = nodes.get(id) {
            groups.entry(key).or_default().push(node.clone());
        }
    }

    let mut threads: Vec<CommentThread> = groups
        .into_iter()
        .filter_map(|(key, members)| CommentThread::assemble(key, members))
        .collect();
    threads.sort_by(|a, b| {
        b.last_comment_ms
            .cmp(&a.last_comment_ms)
            .then_with(|| a.thread_id.cmp(&b.thread_id))
    });
    threads
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn comment(id: &str, parent: Option<&str>, time: i64) -> Value {
        let mut record = json!({
            "comment_biz_id": id,
            "content": format!("body of {id}"),
            "comment_time": time,
            "author": {"name": format!("user-{id}")},
        });
        if let Some(parent) = parent {
            record["parent_comment_biz_id"] = json!(parent);
        }
        record
    }

    fn ids(thread: &CommentThread) -> Vec<&str> {
        thread.comments().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn from_record_reads_aliases() {
        let raw = json!({
            "commentBizId": "c1",
            "parentCommentBizId": "p1",
            "content": "hello",
            "resolved": "true",
            "state": "OPENED",
            "commentType": "INLINE_COMMENT",
            "filePath": "src/lib.rs",
            "commentTime": "2024-05-01 10:00:00",
            "author": {"name": "Alice", "userId": "u-1", "email": "a@example.com"}
        });

        let node = CommentNode::from_record(&raw, None).unwrap();

        assert_eq!(node.id, "c1");
        assert_eq!(node.parent_comment_biz_id.as_deref(), Some("p1"));
        assert!(node.resolved);
        assert_eq!(node.file_path.as_deref(), Some("src/lib.rs"));
        assert_eq!(node.author.as_deref(), Some("Alice"));
        assert_eq!(node.author_candidates, vec!["Alice", "u-1", "a@example.com"]);
        assert_eq!(node.comment_time.as_deref(), Some("2024-05-01 10:00:00"));
        assert!(node.time_ms > 0);
    }

    #[test]
    fn from_record_requires_id() {
        assert_eq!(CommentNode::from_record(&json!({"content": "x"}), None), None);
    }

    #[rstest]
    #[case::self_parent(json!({"id": "a", "parentId": "a"}))]
    #[case::zero_parent(json!({"id": "a", "parent_comment_biz_id": "0"}))]
    fn degenerate_parent_is_ignored(#[case] raw: Value) {
        let node = CommentNode::from_record(&raw, None).unwrap();
        assert_eq!(node.parent_comment_biz_id, None);
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let records = vec![
            json!({"id": "1", "content": "first"}),
            json!({"id": "1", "content": "second"}),
            json!({"content": "no id", "commentTime": "t"}),
            json!({"content": "no id", "commentTime": "t"}),
            json!({"content": "no id", "commentTime": "t2"}),
        ];

        let deduped = dedupe_records(records);

        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0]["content"], "first");
    }

    #[test]
    fn dedupe_collapses_records_without_id_content_or_time() {
        let records = vec![json!({"state": "OPENED"}), json!({}), json!({"id": "7"})];

        let deduped = dedupe_records(records);

        assert_eq!(deduped, vec![json!({"state": "OPENED"}), json!({"id": "7"})]);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let records = vec![
            json!({"id": "1"}),
            json!({"id": "1"}),
            json!({"content": "c"}),
            json!({}),
        ];
        let once = dedupe_records(records);
        let twice = dedupe_records(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn replies_join_root_thread() {
        let records = vec![
            comment("r", None, 1_000),
            comment("a", Some("r"), 2_000),
            comment("b", Some("a"), 3_000),
        ];

        let threads = summarize_threads(&records);

        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].thread_id, "r");
        assert_eq!(ids(&threads[0]), vec!["r", "a", "b"]);
        assert_eq!(threads[0].total_comments, 3);
        assert_eq!(threads[0].participants, vec!["user-r", "user-a", "user-b"]);
        assert_eq!(threads[0].last_comment_ms, 3_000_000);
    }

    #[test]
    fn embedded_children_are_flattened() {
        let records = vec![json!({
            "comment_biz_id": "r",
            "content": "root",
            "child_comments_list": [
                {"comment_biz_id": "c1", "content": "reply", "comment_time": 5},
                {"comment_biz_id": "c2", "parent_comment_biz_id": "c1", "comment_time": 6}
            ]
        })];

        let threads = summarize_threads(&records);

        assert_eq!(threads.len(), 1);
        assert_eq!(ids(&threads[0]), vec!["r", "c1", "c2"]);
        assert!(threads[0].root_comment.raw.get("child_comments_list").is_none());
    }

    #[test]
    fn duplicate_nodes_merge_fields() {
        let records = vec![
            json!({"comment_biz_id": "x", "content": "text"}),
            json!({"comment_biz_id": "x", "file_path": "a.rs", "resolved": true}),
        ];

        let threads = summarize_threads(&records);

        assert_eq!(threads.len(), 1);
        let root = &threads[0].root_comment;
        assert_eq!(root.content.as_deref(), Some("text"));
        assert_eq!(root.file_path.as_deref(), Some("a.rs"));
        assert!(root.resolved);
        assert_eq!(threads[0].total_comments, 1);
    }

    #[test]
    fn dangling_parent_becomes_thread_id() {
        let records = vec![
            comment("a", Some("missing"), 2_000),
            comment("b", Some("a"), 3_000),
            comment("c", Some("missing"), 1_000),
        ];

        let threads = summarize_threads(&records);

        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].thread_id, "missing");
        assert_eq!(threads[0].root_comment.id, "c");
        assert_eq!(ids(&threads[0]), vec!["c", "a", "b"]);
    }

    #[test]
    fn cycles_terminate_in_one_thread() {
        let records = vec![
            comment("a", Some("b"), 1_000),
            comment("b", Some("c"), 2_000),
            comment("c", Some("a"), 3_000),
            comment("d", Some("c"), 4_000),
        ];

        let threads = summarize_threads(&records);

        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].thread_id, "a");
        assert_eq!(threads[0].total_comments, 4);
    }

    #[test]
    fn every_node_lands_in_exactly_one_thread() {
        let records = vec![
            comment("r1", None, 1),
            comment("r1a", Some("r1"), 2),
            comment("r2", None, 3),
            comment("orphan", Some("gone"), 4),
            comment("loop1", Some("loop2"), 5),
            comment("loop2", Some("loop1"), 6),
        ];

        let threads = summarize_threads(&records);

        let mut seen: Vec<&str> = threads.iter().flat_map(ids).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec!["loop1", "loop2", "orphan", "r1", "r1a", "r2"]);
    }

    #[test]
    fn resolved_requires_every_node() {
        let mut root = comment("r", None, 1);
        root["resolved"] = json!(true);
        let reply = comment("a", Some("r"), 2);

        let threads = summarize_threads(&[root.clone(), reply]);
        assert!(!threads[0].resolved);

        let mut resolved_reply = comment("a", Some("r"), 2);
        resolved_reply["resolved"] = json!(true);
        let threads = summarize_threads(&[root, resolved_reply]);
        assert!(threads[0].resolved);
    }

    #[test]
    fn missing_author_is_unknown() {
        let threads = summarize_threads(&[json!({"id": "x"})]);
        assert_eq!(threads[0].participants, vec![UNKNOWN_AUTHOR]);
        assert_eq!(threads[0].last_comment_at, None);
    }

    #[test]
    fn threads_sorted_by_latest_activity() {
        let records = vec![
            comment("old", None, 1_000),
            comment("new", None, 5_000),
            comment("old-reply", Some("old"), 9_000),
        ];

        let threads = summarize_threads(&records);

        let order: Vec<&str> = threads.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(order, vec!["old", "new"]);
    }

    #[test]
    fn numeric_times_are_formatted() {
        let threads = summarize_threads(&[comment("x", None, 1_700_000_000_000)]);
        assert_eq!(
            threads[0].last_comment_at.as_deref(),
            Some("2023-11-14 22:13")
        );
    }
}
