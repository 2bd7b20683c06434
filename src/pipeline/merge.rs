//! Merging freshly processed notices into a source's cached history.
//!
//! Notices are matched by logical identity `(title, link)`. Unmatched history
//! is kept, matches are overwritten field by field, and new notices are
//! appended in the order they were first seen.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::{Notice, Source};

/// A status transition observed on a matched notice.
///
/// `None` on either side means the notice carried no status.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusChange {
    pub title: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Result of merging a batch into existing notices.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub notices: Vec<Notice>,
    pub new_count: usize,
    pub updated_count: usize,
    pub status_changes: Vec<StatusChange>,
}

impl MergeOutcome {
    pub fn status_changed_count(&self) -> usize {
        self.status_changes.len()
    }
}

/// Merge `incoming` into `existing` for one source.
///
/// Status transitions are only tracked for sources that carry a status. A
/// missing status compares as empty, so losing a status counts as a change
/// even though the stored value is kept. Ids are left as they are; call
/// [`assign_ids`] on the result.
pub fn merge_notices(existing: Vec<Notice>, incoming: Vec<Notice>, source: &Source) -> MergeOutcome {
    let mut notices: Vec<Notice> = Vec::with_capacity(existing.len() + incoming.len());
    let mut positions: HashMap<(String, String), usize> = HashMap::with_capacity(existing.len());

    // Duplicates already in history collapse onto their first position.
    for notice in existing {
        let key = identity_key(&notice);
        match positions.get(&key) {
            Some(&pos) => notices[pos].update_from(notice),
            None => {
                positions.insert(key, notices.len());
                notices.push(notice);
            }
        }
    }

    let mut outcome = MergeOutcome::default();

    for notice in incoming {
        let key = identity_key(&notice);
        match positions.get(&key) {
            None => {
                positions.insert(key, notices.len());
                notices.push(notice);
                outcome.new_count += 1;
            }
            Some(&pos) => {
                let stored = &mut notices[pos];
                if source.tracks_status {
                    if let Some(change) = detect_status_change(stored, &notice) {
                        log::info!(
                            "[STATUS] '{}...' status changed: {} → {}",
                            truncate(&change.title, 30),
                            change.from.as_deref().unwrap_or(""),
                            change.to.as_deref().unwrap_or("")
                        );
                        outcome.status_changes.push(change);
                    }
                }
                stored.update_from(notice);
                outcome.updated_count += 1;
            }
        }
    }

    outcome.notices = notices;
    outcome
}

/// Reassign positional ids `{key}-1 ..= {key}-N` over the final order.
pub fn assign_ids(notices: &mut [Notice], source_key: &str) {
    for (i, notice) in notices.iter_mut().enumerate() {
        notice.id = format!("{}-{}", source_key, i + 1);
    }
}

/// Union newly seen tags into a source's persistent tag set.
pub fn merge_tags(existing: &BTreeSet<String>, incoming: &BTreeSet<String>) -> BTreeSet<String> {
    existing.union(incoming).cloned().collect()
}

fn identity_key(notice: &Notice) -> (String, String) {
    let (title, link) = notice.identity();
    (title.to_string(), link.to_string())
}

fn detect_status_change(stored: &Notice, incoming: &Notice) -> Option<StatusChange> {
    let from = stored.status.as_deref().unwrap_or("");
    let to = incoming.status.as_deref().unwrap_or("");
    if from == to {
        return None;
    }
    Some(StatusChange {
        title: incoming.title.clone(),
        from: stored.status.clone(),
        to: incoming.status.clone(),
    })
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn board() -> Source {
        Source::new("main", "메인공지", "#1a73e8", "🏫")
    }

    fn cando() -> Source {
        Source::new("cando", "캔두", "#e91e63", "🎯").with_status()
    }

    fn make_notice(source: &Source, title: &str, link: &str, date: &str) -> Notice {
        Notice {
            id: String::new(),
            title: title.to_string(),
            link: link.to_string(),
            date: date.to_string(),
            tags: Vec::new(),
            source: source.key.clone(),
            source_name: source.name.clone(),
            source_color: source.color.clone(),
            source_icon: source.icon.clone(),
            status: None,
        }
    }

    fn with_status(mut notice: Notice, status: &str) -> Notice {
        notice.status = Some(status.to_string());
        notice
    }

    #[test]
    fn test_merge_scenario() {
        let src = board();
        let existing = vec![make_notice(&src, "A", "L1", "2025-01-01")];
        let incoming = vec![
            make_notice(&src, "A", "L1", "2025-01-02"),
            make_notice(&src, "B", "L2", "2025-01-03"),
        ];

        let outcome = merge_notices(existing, incoming, &src);

        assert_eq!(outcome.notices.len(), 2);
        assert_eq!(outcome.new_count, 1);
        assert_eq!(outcome.updated_count, 1);
        assert_eq!(outcome.notices[0].title, "A");
        assert_eq!(outcome.notices[0].date, "2025-01-02");
        assert_eq!(outcome.notices[1].title, "B");
    }

    #[test]
    fn test_merge_preserves_unmatched_history() {
        let src = board();
        let existing = vec![
            make_notice(&src, "Old", "L0", "2024-12-01"),
            make_notice(&src, "A", "L1", "2025-01-01"),
        ];
        let incoming = vec![make_notice(&src, "A", "L1", "2025-01-01")];

        let outcome = merge_notices(existing, incoming, &src);
        let titles: Vec<_> = outcome.notices.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Old", "A"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let src = board();
        let existing = vec![make_notice(&src, "X", "LX", "2025-01-01")];
        let incoming = vec![
            make_notice(&src, "A", "L1", "2025-01-02"),
            make_notice(&src, "B", "L2", "2025-01-03"),
        ];

        let first = merge_notices(existing, incoming.clone(), &src);
        let second = merge_notices(first.notices.clone(), incoming.clone(), &src);

        assert_eq!(second.new_count, 0);
        assert_eq!(second.updated_count, incoming.len());
        assert_eq!(second.notices, first.notices);
    }

    #[test]
    fn test_merge_never_duplicates_identity() {
        let src = board();
        let existing = vec![
            make_notice(&src, "A", "L1", "2025-01-01"),
            make_notice(&src, "A", "L1", "2025-01-05"),
            make_notice(&src, "A", "L2", "2025-01-01"),
        ];
        let incoming = vec![
            make_notice(&src, "A", "L1", "2025-01-02"),
            make_notice(&src, "C", "링크 없음", "2025-01-02"),
            make_notice(&src, "C", "링크 없음", "2025-01-03"),
        ];

        let outcome = merge_notices(existing, incoming, &src);

        let identities: HashSet<_> = outcome
            .notices
            .iter()
            .map(|n| (n.title.clone(), n.link.clone()))
            .collect();
        assert_eq!(identities.len(), outcome.notices.len());
        assert_eq!(outcome.notices.len(), 3);
        assert_eq!(outcome.new_count, 1);
        assert_eq!(outcome.updated_count, 2);
    }

    #[test]
    fn test_sentinel_link_matches_on_title() {
        let src = board();
        let existing = vec![make_notice(&src, "Closed", "링크 없음", "2025-01-01")];
        let incoming = vec![make_notice(&src, "Closed", "링크 없음", "2025-01-09")];

        let outcome = merge_notices(existing, incoming, &src);
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].date, "2025-01-09");
    }

    #[test]
    fn test_status_change_detected_once() {
        let src = cando();
        let existing = vec![with_status(make_notice(&src, "A", "L1", "2025-01-01"), "진행중")];
        let incoming = vec![with_status(make_notice(&src, "A", "L1", "2025-01-01"), "마감")];

        let outcome = merge_notices(existing, incoming, &src);

        assert_eq!(outcome.status_changed_count(), 1);
        assert_eq!(
            outcome.status_changes[0],
            StatusChange {
                title: "A".to_string(),
                from: Some("진행중".to_string()),
                to: Some("마감".to_string()),
            }
        );
        assert_eq!(outcome.notices[0].status.as_deref(), Some("마감"));
    }

    #[test]
    fn test_dropped_status_counts_as_change() {
        let src = cando();
        let existing = vec![with_status(make_notice(&src, "A", "L1", "2025-01-01"), "진행중")];
        let incoming = vec![make_notice(&src, "A", "L1", "2025-01-01")];

        let outcome = merge_notices(existing, incoming, &src);

        assert_eq!(outcome.status_changed_count(), 1);
        assert_eq!(outcome.status_changes[0].from.as_deref(), Some("진행중"));
        assert_eq!(outcome.status_changes[0].to, None);
        assert_eq!(outcome.notices[0].status.as_deref(), Some("진행중"));
    }

    #[test]
    fn test_missing_status_on_both_sides_not_counted() {
        let src = cando();
        let existing = vec![make_notice(&src, "A", "L1", "2025-01-01")];
        let incoming = vec![make_notice(&src, "A", "L1", "2025-01-02")];

        let outcome = merge_notices(existing, incoming, &src);
        assert_eq!(outcome.status_changed_count(), 0);
    }

    #[test]
    fn test_unchanged_status_not_counted() {
        let src = cando();
        let existing = vec![with_status(make_notice(&src, "A", "L1", "2025-01-01"), "마감")];
        let incoming = vec![with_status(make_notice(&src, "A", "L1", "2025-01-01"), "마감")];

        let outcome = merge_notices(existing, incoming, &src);
        assert_eq!(outcome.status_changed_count(), 0);
        assert_eq!(outcome.updated_count, 1);
    }

    #[test]
    fn test_status_ignored_for_plain_sources() {
        let src = board();
        let existing = vec![with_status(make_notice(&src, "A", "L1", "2025-01-01"), "진행중")];
        let incoming = vec![with_status(make_notice(&src, "A", "L1", "2025-01-01"), "마감")];

        let outcome = merge_notices(existing, incoming, &src);
        assert_eq!(outcome.status_changed_count(), 0);
        assert_eq!(outcome.notices[0].status.as_deref(), Some("마감"));
    }

    #[test]
    fn test_assign_ids_positional() {
        let src = board();
        let mut notices = vec![
            make_notice(&src, "A", "L1", "2025-01-01"),
            make_notice(&src, "B", "L2", "2025-01-02"),
            make_notice(&src, "C", "L3", "2025-01-03"),
        ];
        assign_ids(&mut notices, "main");
        let ids: Vec<_> = notices.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["main-1", "main-2", "main-3"]);
    }

    #[test]
    fn test_tags_only_grow() {
        let existing: BTreeSet<String> = ["장학", "모집"].iter().map(|s| s.to_string()).collect();
        let incoming: BTreeSet<String> = ["모집", "특강"].iter().map(|s| s.to_string()).collect();

        let merged = merge_tags(&existing, &incoming);
        assert!(existing.is_subset(&merged));
        assert_eq!(merged.len(), 3);

        let unchanged = merge_tags(&merged, &BTreeSet::new());
        assert_eq!(unchanged, merged);
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("장학금 신청 안내", 3), "장학금");
        assert_eq!(truncate("short", 30), "short");
    }
}
