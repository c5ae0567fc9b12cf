//! Patchset normalization and diff-range selection.
//!
//! A change request carries a list of patchsets: `merge_source` revisions
//! (what the author pushed) and `merge_target` revisions (snapshots of the
//! target branch the source was compared against). A useful diff range
//! pairs the newest source with the target snapshot it was based on.

use serde::Serialize;
use serde_json::Value;

use crate::shared::json::{first_i64, first_str};
use crate::shared::time::value_to_ms;

const ID_KEYS: &[&str] = &[
    "patchSetBizId",
    "patchsetBizId",
    "patch_set_biz_id",
    "bizId",
    "id",
];
const VERSION_KEYS: &[&str] = &["versionNo", "version", "patchSetVersion", "patchSetNo"];
const CREATE_TIME_KEYS: &[&str] = &["createTime", "gmtCreate", "createdAt", "create_time"];
const COMMIT_KEYS: &[&str] = &["commitId", "commit_id", "sha", "headCommitId", "revision"];
const TYPE_KEYS: &[&str] = &[
    "relatedMergeItemType",
    "relatedMergeType",
    "mergeItemType",
    "patchSetType",
    "type",
];
const REF_KEYS: &[&str] = &["ref", "refName", "patchSetRef"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchsetKind {
    MergeSource,
    MergeTarget,
    Unknown,
}

impl PatchsetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MergeSource => "merge_source",
            Self::MergeTarget => "merge_target",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patchset {
    pub id: String,
    pub version: i64,
    /// Epoch milliseconds; 0 when the API omitted it.
    pub create_time: i64,
    #[serde(rename = "type")]
    pub kind: PatchsetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

/// The `from`/`to` pair sent to diff endpoints. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchsetRange {
    #[serde(rename = "fromPatchSetBizId")]
    pub from: Option<String>,
    #[serde(rename = "toPatchSetBizId")]
    pub to: Option<String>,
}

/// Classify a raw patchset by its type fields, falling back to the ref name.
pub fn classify(raw: &Value) -> PatchsetKind {
    for key in TYPE_KEYS {
        if let Some(kind) = first_str(raw, &[*key]) {
            let kind = kind.to_ascii_uppercase();
            if kind.contains("SOURCE") {
                return PatchsetKind::MergeSource;
            }
            if kind.contains("TARGET") {
                return PatchsetKind::MergeTarget;
            }
        }
    }

    match first_str(raw, REF_KEYS) {
        Some(r) if r.contains("/target/") => PatchsetKind::MergeTarget,
        Some(r) if r.contains("/changes/") => PatchsetKind::MergeSource,
        _ => PatchsetKind::Unknown,
    }
}

/// Normalize one raw record. Records without an ID are dropped.
pub fn parse_patchset(raw: &Value) -> Option<Patchset> {
    let id = first_str(raw, ID_KEYS)?;
    let create_time = CREATE_TIME_KEYS
        .iter()
        .filter_map(|key| raw.get(*key))
        .find_map(value_to_ms)
        .unwrap_or(0);

    Some(Patchset {
        id,
        version: first_i64(raw, VERSION_KEYS).unwrap_or(0),
        create_time,
        kind: classify(raw),
        commit_id: first_str(raw, COMMIT_KEYS),
    })
}

pub fn parse_patchsets(raw: &[Value]) -> Vec<Patchset> {
    raw.iter().filter_map(parse_patchset).collect()
}

/// Sort ascending by `(version, create_time)`. The sort is stable, so ties
/// keep API order.
pub fn sort_patchsets(patchsets: &mut [Patchset]) {
    patchsets.sort_by_key(|p| (p.version, p.create_time));
}

fn latest_of_kind<'a>(
    sorted: &'a [Patchset],
    kind: PatchsetKind,
    exclude: Option<&str>,
) -> Option<&'a Patchset> {
    sorted
        .iter()
        .rev()
        .find(|p| p.kind == kind && Some(p.id.as_str()) != exclude)
}

fn latest_excluding<'a>(sorted: &'a [Patchset], exclude: Option<&str>) -> Option<&'a Patchset> {
    sorted
        .iter()
        .rev()
        .find(|p| Some(p.id.as_str()) != exclude)
}

/// Choose the base to diff `to_id` against.
///
/// Preference: the newest target snapshot not newer than `to`, then any
/// target snapshot, then the source revision pushed before `to`, then any
/// other patchset.
fn best_base<'a>(sorted: &'a [Patchset], to_id: &str) -> Option<&'a Patchset> {
    let to_index = sorted.iter().position(|p| p.id == to_id);
    let to_version = to_index.map(|i| sorted[i].version);

    let target_not_newer = to_version.and_then(|version| {
        sorted
            .iter()
            .rev()
            .find(|p| p.kind == PatchsetKind::MergeTarget && p.version <= version && p.id != to_id)
    });

    let previous_source = to_index.and_then(|index| {
        sorted[..index]
            .iter()
            .rev()
            .find(|p| p.kind == PatchsetKind::MergeSource)
    });

    target_not_newer
        .or_else(|| latest_of_kind(sorted, PatchsetKind::MergeTarget, Some(to_id)))
        .or(previous_source)
        .or_else(|| latest_excluding(sorted, Some(to_id)))
}

/// The range the tool would pick with no explicit input.
/// `sorted` must already be ordered by [`sort_patchsets`].
pub fn suggested_range(sorted: &[Patchset]) -> PatchsetRange {
    let Some(to) = latest_of_kind(sorted, PatchsetKind::MergeSource, None).or(sorted.last()) else {
        return PatchsetRange::default();
    };
    PatchsetRange {
        from: best_base(sorted, &to.id).map(|p| p.id.clone()),
        to: Some(to.id.clone()),
    }
}

/// Resolve the diff range, honoring explicit `--from`/`--to` values.
///
/// Explicit IDs are used verbatim even when they do not appear in
/// `patchsets`. The result never has `from == to` unless no other
/// patchset exists, in which case `from` is `None`.
pub fn resolve_range(
    patchsets: &[Patchset],
    explicit_from: Option<&str>,
    explicit_to: Option<&str>,
) -> PatchsetRange {
    if patchsets.is_empty() {
        return PatchsetRange {
            from: explicit_from.map(str::to_string),
            to: explicit_to.map(str::to_string),
        };
    }

    let mut sorted = patchsets.to_vec();
    sort_patchsets(&mut sorted);
    let suggestion = suggested_range(&sorted);

    let to = explicit_to.map(str::to_string).or(suggestion.to).or_else(|| {
        latest_of_kind(&sorted, PatchsetKind::MergeSource, explicit_from)
            .or_else(|| latest_excluding(&sorted, explicit_from))
            .map(|p| p.id.clone())
    });

    let mut from = match (explicit_from, &to) {
        (Some(from), _) => Some(from.to_string()),
        (None, Some(to)) => best_base(&sorted, to).map(|p| p.id.clone()),
        (None, None) => None,
    };

    if from.is_some() && from == to {
        from = latest_excluding(&sorted, to.as_deref()).map(|p| p.id.clone());
    }

    PatchsetRange { from, to }
}

/// Look up a patchset by ID.
pub fn find<'a>(patchsets: &'a [Patchset], id: &str) -> Option<&'a Patchset> {
    patchsets.iter().find(|p| p.id == id)
}
