//! Reporting lines between users.

use std::collections::{HashMap, HashSet, VecDeque};

use comptrack_shared::types::UserId;

/// Who reports to whom, built from `(user, manager)` pairs.
///
/// Bad data can contain cycles (A reports to B, B reports to A). Every walk
/// keeps a visited set, so cycles end the walk instead of looping.
#[derive(Debug, Clone, Default)]
pub struct ReportingTree {
    manager_of: HashMap<UserId, UserId>,
    reports_of: HashMap<UserId, Vec<UserId>>,
}

impl ReportingTree {
    /// Builds the tree. Users without a manager may be passed with `None`
    /// or left out.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (UserId, Option<UserId>)>,
    {
        let mut tree = Self::default();
        for (user, manager) in edges {
            if let Some(manager) = manager {
                tree.manager_of.insert(user, manager);
                tree.reports_of.entry(manager).or_default().push(user);
            }
        }
        tree
    }

    /// Direct manager of `user`.
    #[must_use]
    pub fn manager_of(&self, user: UserId) -> Option<UserId> {
        self.manager_of.get(&user).copied()
    }

    /// Managers above `user`, nearest first.
    #[must_use]
    pub fn chain(&self, user: UserId) -> Vec<UserId> {
        let mut seen = HashSet::from([user]);
        let mut out = Vec::new();
        let mut current = user;
        while let Some(next) = self.manager_of(current) {
            if !seen.insert(next) {
                break;
            }
            out.push(next);
            current = next;
        }
        out
    }

    /// Returns true if `manager` sits anywhere above `user`.
    /// Nobody is their own manager, even inside a cycle.
    #[must_use]
    pub fn is_manager_of(&self, manager: UserId, user: UserId) -> bool {
        manager != user && self.chain(user).contains(&manager)
    }

    /// Returns true if anyone reports directly to `user`.
    #[must_use]
    pub fn has_reports(&self, user: UserId) -> bool {
        self.reports_of.get(&user).is_some_and(|r| !r.is_empty())
    }

    /// Direct and indirect reports of `manager`, breadth first.
    #[must_use]
    pub fn subordinates(&self, manager: UserId) -> Vec<UserId> {
        let mut seen = HashSet::from([manager]);
        let mut queue = VecDeque::from([manager]);
        let mut out = Vec::new();

        while let Some(id) = queue.pop_front() {
            for &report in self.reports_of.get(&id).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(report) {
                    out.push(report);
                    queue.push_back(report);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// vp <- director <- manager <- rep_a, rep_b
    fn org() -> (ReportingTree, [UserId; 5]) {
        let ids = [
            UserId::new(),
            UserId::new(),
            UserId::new(),
            UserId::new(),
            UserId::new(),
        ];
        let [vp, director, manager, rep_a, rep_b] = ids;
        let tree = ReportingTree::from_edges([
            (vp, None),
            (director, Some(vp)),
            (manager, Some(director)),
            (rep_a, Some(manager)),
            (rep_b, Some(manager)),
        ]);
        (tree, ids)
    }

    #[test]
    fn test_is_manager_of_walks_chain() {
        let (tree, [vp, director, manager, rep_a, rep_b]) = org();

        assert!(tree.is_manager_of(manager, rep_a));
        assert!(tree.is_manager_of(vp, rep_b));
        assert!(tree.is_manager_of(director, manager));
        assert!(!tree.is_manager_of(rep_a, rep_b));
        assert!(!tree.is_manager_of(rep_a, manager));
        assert!(!tree.is_manager_of(manager, manager));
    }

    #[test]
    fn test_chain_nearest_first() {
        let (tree, [vp, director, manager, rep_a, _]) = org();
        assert_eq!(tree.chain(rep_a), vec![manager, director, vp]);
        assert!(tree.chain(vp).is_empty());
    }

    #[test]
    fn test_subordinates() {
        let (tree, [vp, director, manager, rep_a, rep_b]) = org();

        let mut under_vp = tree.subordinates(vp);
        under_vp.sort();
        let mut expected = vec![director, manager, rep_a, rep_b];
        expected.sort();
        assert_eq!(under_vp, expected);

        assert!(tree.subordinates(rep_a).is_empty());
        assert!(tree.has_reports(manager));
        assert!(!tree.has_reports(rep_a));
    }

    #[test]
    fn test_cycles_terminate() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();
        let tree = ReportingTree::from_edges([(a, Some(b)), (b, Some(c)), (c, Some(a))]);

        assert!(tree.is_manager_of(b, a));
        assert!(tree.is_manager_of(a, c));
        assert!(!tree.is_manager_of(a, a));
        assert_eq!(tree.chain(a), vec![b, c]);
        assert_eq!(tree.subordinates(a).len(), 2);
    }
}
