//! Who may move a commission through the workflow.

use comptrack_shared::types::UserId;
use serde::{Deserialize, Serialize};

use crate::team::ReportingTree;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::ApprovalAction;

/// The user performing a workflow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User ID.
    pub user_id: UserId,
    /// Company administrator.
    pub is_admin: bool,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }
}

/// Authorization rules for workflow actions.
///
/// | Action    | Allowed                                      |
/// |-----------|----------------------------------------------|
/// | submit    | owner, a manager above the owner, admin      |
/// | approve   | admin, a manager above the owner             |
/// | reject    | same as approve                              |
/// | adjust    | admin, a manager above the owner             |
/// | mark paid | admin                                        |
///
/// Reviewing your own commission is refused unless `allow_self_approval`,
/// and even then only admins and users with reports may do it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Lets a user approve or reject their own commission.
    pub allow_self_approval: bool,
}

impl ApprovalPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(allow_self_approval: bool) -> Self {
        Self {
            allow_self_approval,
        }
    }

    /// Checks that `actor` may perform `action` on a commission owned by `owner`.
    pub fn authorize(
        &self,
        action: ApprovalAction,
        actor: Actor,
        owner: UserId,
        tree: &ReportingTree,
    ) -> Result<(), WorkflowError> {
        let is_owner = actor.user_id == owner;
        let above_owner = tree.is_manager_of(actor.user_id, owner);

        let allowed = match action {
            ApprovalAction::Submit => is_owner || above_owner || actor.is_admin,
            ApprovalAction::Approve | ApprovalAction::Reject => {
                if is_owner && !self.allow_self_approval {
                    return Err(WorkflowError::SelfApproval);
                }
                let reviewer = actor.is_admin || tree.has_reports(actor.user_id);
                actor.is_admin || above_owner || (is_owner && reviewer)
            }
            ApprovalAction::Adjust | ApprovalAction::Recalculate => actor.is_admin || above_owner,
            ApprovalAction::MarkPaid => actor.is_admin,
            // Calculation is triggered by closing a deal, which the owner does.
            ApprovalAction::Calculate => is_owner || above_owner || actor.is_admin,
        };

        if allowed {
            Ok(())
        } else {
            Err(WorkflowError::NotAuthorized {
                user_id: actor.user_id,
                action,
            })
        }
    }
}
