//! Derived pedagogical ordering rules (spec §3, F10): per subject, CM
//! precedes its TDs and TPs, and each TD precedes all TPs of the same
//! subject.

use crate::model::entities::{OrderingRule, Session, SessionIdx, SessionKind};
use std::collections::HashMap;

pub fn derive_ordering_rules(sessions: &[Session]) -> Vec<OrderingRule> {
    let mut by_subject: HashMap<&str, Vec<SessionIdx>> = HashMap::new();
    for (i, s) in sessions.iter().enumerate() {
        by_subject.entry(s.subject.as_str()).or_default().push(SessionIdx(i));
    }

    let mut rules = Vec::new();
    for ids in by_subject.values() {
        let cms: Vec<_> = ids.iter().copied().filter(|i| sessions[i.index()].kind == SessionKind::Cm).collect();
        let tds: Vec<_> = ids.iter().copied().filter(|i| sessions[i.index()].kind == SessionKind::Td).collect();
        let tps: Vec<_> = ids.iter().copied().filter(|i| sessions[i.index()].kind == SessionKind::Tp).collect();

        for &cm in &cms {
            for &td in &tds {
                rules.push(OrderingRule { before: cm, after: td });
            }
            for &tp in &tps {
                rules.push(OrderingRule { before: cm, after: tp });
            }
        }
        for &td in &tds {
            for &tp in &tps {
                rules.push(OrderingRule { before: td, after: tp });
            }
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entities::GroupIdx;

    fn session(id: &str, kind: SessionKind, subject: &str) -> Session {
        Session {
            id: id.into(),
            kind,
            subject: subject.into(),
            duration: 2,
            groups: vec![GroupIdx(0)],
            allowed_teachers: vec![],
            allowed_rooms: vec![],
            obligations: vec![],
        }
    }

    #[test]
    fn cm_precedes_td_and_tp_td_precedes_tp_same_subject() {
        let sessions = vec![
            session("cm", SessionKind::Cm, "M"),
            session("td", SessionKind::Td, "M"),
            session("tp", SessionKind::Tp, "M"),
        ];
        let rules = derive_ordering_rules(&sessions);
        assert_eq!(rules.len(), 3);
        let pairs: Vec<_> = rules.iter().map(|r| (r.before.index(), r.after.index())).collect();
        assert!(pairs.contains(&(0, 1)));
        assert!(pairs.contains(&(0, 2)));
        assert!(pairs.contains(&(1, 2)));
    }

    #[test]
    fn different_subjects_never_ordered() {
        let sessions = vec![
            session("cm_m", SessionKind::Cm, "M"),
            session("td_p", SessionKind::Td, "P"),
        ];
        assert!(derive_ordering_rules(&sessions).is_empty());
    }
}
