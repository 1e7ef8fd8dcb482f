//! Parent/child target maintenance: overlap checks, annual splits, and
//! orphan detection.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Months;
use comptrack_shared::types::TargetId;
use rust_decimal::Decimal;

use super::error::TargetError;
use super::types::{NewTarget, Target};
use crate::period::{Period, PeriodType};

/// Quarters in an annual target.
const QUARTERS: u32 = 4;

/// Stateless helpers over a company's set of targets.
pub struct TargetHierarchy;

impl TargetHierarchy {
    /// Rejects `candidate` if an active target with the same owner and the
    /// same period type already covers part of its period.
    ///
    /// The owner is the user when one is set, otherwise the role
    /// (case-insensitive). Targets of a different period type never
    /// conflict, so an annual target and its quarterly children coexist.
    pub fn check_overlap(existing: &[Target], candidate: &NewTarget) -> Result<(), TargetError> {
        let clash = existing.iter().find(|t| {
            t.is_active
                && t.company_id == candidate.company_id
                && t.period.period_type == candidate.period.period_type
                && same_owner(t, candidate)
                && t.period.overlaps(&candidate.period)
        });

        match clash {
            Some(t) => Err(TargetError::Overlap { existing: t.id }),
            None => Ok(()),
        }
    }

    /// Builds the four quarterly children of an annual target.
    ///
    /// Each child gets a quarter of the quota rounded to cents, with the
    /// last quarter absorbing the rounding remainder so the children sum to
    /// the parent exactly. Rate, owner, and company are inherited.
    pub fn split_annual(parent: &Target, existing: &[Target]) -> Result<Vec<NewTarget>, TargetError> {
        if parent.period.period_type != PeriodType::Annual {
            return Err(TargetError::NotAnnual(parent.id));
        }
        if !parent.is_active {
            return Err(TargetError::Inactive(parent.id));
        }
        if existing
            .iter()
            .any(|t| t.is_active && t.parent_target_id == Some(parent.id))
        {
            return Err(TargetError::AlreadySplit(parent.id));
        }

        let share = (parent.quota_amount / Decimal::from(QUARTERS)).round_dp(2);
        let mut allocated = Decimal::ZERO;
        let mut children = Vec::with_capacity(QUARTERS as usize);

        for quarter in 0..QUARTERS {
            let start = parent
                .period
                .start
                .checked_add_months(Months::new(quarter * 3))
                .ok_or(TargetError::InvalidPeriod)?;
            let period =
                Period::starting_at(start, PeriodType::Quarterly).ok_or(TargetError::InvalidPeriod)?;
            let quota_amount = if quarter + 1 == QUARTERS {
                parent.quota_amount - allocated
            } else {
                share
            };
            allocated += quota_amount;

            children.push(NewTarget {
                company_id: parent.company_id,
                user_id: parent.user_id,
                role: parent.role.clone(),
                period,
                quota_amount,
                commission_rate: parent.commission_rate,
                parent_target_id: Some(parent.id),
            });
        }

        Ok(children)
    }

    /// Returns every descendant of `root` (children, grandchildren, ...),
    /// breadth first. `root` itself is not included.
    #[must_use]
    pub fn descendants(targets: &[Target], root: TargetId) -> Vec<TargetId> {
        let mut children: HashMap<TargetId, Vec<TargetId>> = HashMap::new();
        for t in targets {
            if let Some(parent) = t.parent_target_id {
                children.entry(parent).or_default().push(t.id);
            }
        }

        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        let mut out = Vec::new();

        while let Some(id) = queue.pop_front() {
            for &child in children.get(&id).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }

        out
    }

    /// Returns active targets whose parent is missing or inactive.
    #[must_use]
    pub fn orphaned_children(targets: &[Target]) -> Vec<TargetId> {
        let active: HashMap<TargetId, bool> =
            targets.iter().map(|t| (t.id, t.is_active)).collect();

        targets
            .iter()
            .filter(|t| t.is_active)
            .filter(|t| {
                t.parent_target_id
                    .is_some_and(|parent| !active.get(&parent).copied().unwrap_or(false))
            })
            .map(|t| t.id)
            .collect()
    }
}

fn same_owner(existing: &Target, candidate: &NewTarget) -> bool {
    match (existing.user_id, candidate.user_id) {
        (Some(a), Some(b)) => a == b,
        (None, None) => match (existing.role.as_deref(), candidate.role.as_deref()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use comptrack_shared::types::{CompanyId, UserId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn annual(company_id: CompanyId, user_id: UserId, quota: Decimal) -> Target {
        Target {
            id: TargetId::new(),
            company_id,
            user_id: Some(user_id),
            role: None,
            period: Period::containing(date(2026, 1, 1), PeriodType::Annual).unwrap(),
            quota_amount: quota,
            commission_rate: dec!(0.08),
            is_active: true,
            parent_target_id: None,
        }
    }

    fn candidate_from(t: &Target) -> NewTarget {
        NewTarget {
            company_id: t.company_id,
            user_id: t.user_id,
            role: t.role.clone(),
            period: t.period,
            quota_amount: t.quota_amount,
            commission_rate: t.commission_rate,
            parent_target_id: None,
        }
    }

    #[test]
    fn test_overlap_same_user_same_type_rejected() {
        let existing = annual(CompanyId::new(), UserId::new(), dec!(100000));
        let candidate = candidate_from(&existing);

        let err = TargetHierarchy::check_overlap(&[existing.clone()], &candidate).unwrap_err();
        assert!(matches!(err, TargetError::Overlap { existing: id } if id == existing.id));
    }

    #[test]
    fn test_overlap_ignores_other_type_inactive_and_other_user() {
        let mut existing = annual(CompanyId::new(), UserId::new(), dec!(100000));

        let mut quarterly = candidate_from(&existing);
        quarterly.period = Period::containing(date(2026, 4, 1), PeriodType::Quarterly).unwrap();
        assert!(TargetHierarchy::check_overlap(&[existing.clone()], &quarterly).is_ok());

        let mut other_user = candidate_from(&existing);
        other_user.user_id = Some(UserId::new());
        assert!(TargetHierarchy::check_overlap(&[existing.clone()], &other_user).is_ok());

        let same = candidate_from(&existing);
        existing.is_active = false;
        assert!(TargetHierarchy::check_overlap(&[existing], &same).is_ok());
    }

    #[test]
    fn test_overlap_role_targets_compare_case_insensitively() {
        let mut existing = annual(CompanyId::new(), UserId::new(), dec!(50000));
        existing.user_id = None;
        existing.role = Some("sales_rep".into());

        let mut candidate = candidate_from(&existing);
        candidate.role = Some("SALES_REP".into());
        assert!(TargetHierarchy::check_overlap(&[existing.clone()], &candidate).is_err());

        candidate.role = Some("manager".into());
        assert!(TargetHierarchy::check_overlap(&[existing], &candidate).is_ok());
    }

    #[test]
    fn test_split_annual_builds_calendar_quarters() {
        let parent = annual(CompanyId::new(), UserId::new(), dec!(120000));
        let children = TargetHierarchy::split_annual(&parent, &[]).unwrap();

        assert_eq!(children.len(), 4);
        let starts: Vec<_> = children.iter().map(|c| c.period.start).collect();
        assert_eq!(
            starts,
            vec![date(2026, 1, 1), date(2026, 4, 1), date(2026, 7, 1), date(2026, 10, 1)]
        );
        assert_eq!(children[3].period.end, date(2026, 12, 31));
        for child in &children {
            assert_eq!(child.quota_amount, dec!(30000));
            assert_eq!(child.commission_rate, parent.commission_rate);
            assert_eq!(child.parent_target_id, Some(parent.id));
            assert_eq!(child.period.period_type, PeriodType::Quarterly);
        }
    }

    #[test]
    fn test_split_annual_last_quarter_takes_remainder() {
        let parent = annual(CompanyId::new(), UserId::new(), dec!(100000.01));
        let children = TargetHierarchy::split_annual(&parent, &[]).unwrap();

        assert_eq!(children[0].quota_amount, dec!(25000.00));
        assert_eq!(children[3].quota_amount, dec!(25000.01));
        let total: Decimal = children.iter().map(|c| c.quota_amount).sum();
        assert_eq!(total, parent.quota_amount);
    }

    #[test]
    fn test_split_rejects_non_annual_and_already_split() {
        let company = CompanyId::new();
        let user = UserId::new();
        let parent = annual(company, user, dec!(120000));

        let mut quarterly = parent.clone();
        quarterly.period = Period::containing(date(2026, 1, 1), PeriodType::Quarterly).unwrap();
        assert!(matches!(
            TargetHierarchy::split_annual(&quarterly, &[]),
            Err(TargetError::NotAnnual(_))
        ));

        let child = TargetHierarchy::split_annual(&parent, &[]).unwrap()[0]
            .clone()
            .into_target();
        assert!(matches!(
            TargetHierarchy::split_annual(&parent, &[child]),
            Err(TargetError::AlreadySplit(_))
        ));
    }

    #[test]
    fn test_descendants_walks_all_levels() {
        let root = annual(CompanyId::new(), UserId::new(), dec!(120000));
        let mut child = root.clone();
        child.id = TargetId::new();
        child.parent_target_id = Some(root.id);
        let mut grandchild = root.clone();
        grandchild.id = TargetId::new();
        grandchild.parent_target_id = Some(child.id);
        let unrelated = annual(root.company_id, UserId::new(), dec!(1));

        let targets = vec![root.clone(), child.clone(), grandchild.clone(), unrelated];
        assert_eq!(
            TargetHierarchy::descendants(&targets, root.id),
            vec![child.id, grandchild.id]
        );
        assert!(TargetHierarchy::descendants(&targets, grandchild.id).is_empty());
    }

    #[test]
    fn test_orphaned_children() {
        let mut parent = annual(CompanyId::new(), UserId::new(), dec!(120000));
        let children: Vec<Target> = TargetHierarchy::split_annual(&parent, &[])
            .unwrap()
            .into_iter()
            .map(NewTarget::into_target)
            .collect();

        let mut targets = vec![parent.clone()];
        targets.extend(children.iter().cloned());
        assert!(TargetHierarchy::orphaned_children(&targets).is_empty());

        parent.is_active = false;
        targets[0] = parent;
        assert_eq!(TargetHierarchy::orphaned_children(&targets).len(), 4);

        // Parent row gone entirely.
        let only_children: Vec<Target> = children;
        assert_eq!(TargetHierarchy::orphaned_children(&only_children).len(), 4);
    }
}
