//! Group hierarchy (sub-group → parent group) and the derived group→session
//! index (spec §3). Grounded on `original_source/group_classifier.py`, which
//! classifies a flat group-name string (e.g. `"G1A"`) against its promotion
//! (`"G1"`); here the relation is a first-class `parent: Option<GroupIdx>`
//! field on `Group` instead of string parsing.

use crate::model::entities::{Group, GroupIdx, Session, SessionIdx};
use std::collections::HashMap;

/// All (sub, parent) edges in the hierarchy, used directly by F4.
pub fn hierarchy_edges(groups: &[Group]) -> Vec<(GroupIdx, GroupIdx)> {
    groups
        .iter()
        .enumerate()
        .filter_map(|(i, g)| g.parent.map(|p| (GroupIdx(i), p)))
        .collect()
}

/// Ancestor chain of `group` (parent, grandparent, ...), nearest first.
pub fn ancestors(group: GroupIdx, groups: &[Group]) -> Vec<GroupIdx> {
    let mut out = Vec::new();
    let mut current = groups[group.index()].parent;
    while let Some(p) = current {
        out.push(p);
        current = groups[p.index()].parent;
    }
    out
}

/// For each group, the sessions that "concern" it: directly affected, plus
/// any session directly affecting an ancestor (a promotion-wide CM consumes
/// time for every sub-group transitively beneath it). Used by the Feasibility
/// Diagnostic's group-overbooked check (spec §4.2 check 3).
pub fn group_session_index(
    sessions: &[Session],
    groups: &[Group],
) -> HashMap<GroupIdx, Vec<SessionIdx>> {
    let mut index: HashMap<GroupIdx, Vec<SessionIdx>> = HashMap::new();
    for (si, session) in sessions.iter().enumerate() {
        for &g in &session.groups {
            index.entry(g).or_default().push(SessionIdx(si));
            for anc in ancestors(g, groups) {
                index.entry(anc).or_default().push(SessionIdx(si));
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entities::SessionKind;

    fn group(id: &str, parent: Option<GroupIdx>) -> Group {
        Group {
            id: id.to_string(),
            name: id.to_string(),
            parent,
            student_count: 20,
        }
    }

    #[test]
    fn transitive_index_includes_ancestor_sessions() {
        let groups = vec![group("G1", None), group("G1A", Some(GroupIdx(0)))];
        let sessions = vec![Session {
            id: "s1".into(),
            kind: SessionKind::Cm,
            subject: "M".into(),
            duration: 2,
            groups: vec![GroupIdx(0)],
            allowed_teachers: vec![],
            allowed_rooms: vec![],
            obligations: vec![],
        }];
        let idx = group_session_index(&sessions, &groups);
        assert_eq!(idx[&GroupIdx(0)], vec![SessionIdx(0)]);
        assert_eq!(idx[&GroupIdx(1)], vec![SessionIdx(0)]);
    }

    #[test]
    fn group_with_zero_sessions_has_no_entry() {
        let groups = vec![group("G1", None)];
        let sessions: Vec<Session> = vec![];
        let idx = group_session_index(&sessions, &groups);
        assert!(idx.get(&GroupIdx(0)).is_none());
    }
}
