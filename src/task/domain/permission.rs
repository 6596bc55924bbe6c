//! Table-driven permission evaluation for task operations.
//!
//! Every decision is a lookup over [`PERMISSION_TABLE`]. Rows are keyed by
//! role, task kind, the actor's relation to the task and the operation;
//! matching rows are unioned and anything without a row is denied. There is
//! no role inheritance: an administrator can only do what an `Admin` row
//! says.

use super::{FieldSet, Task, TaskField, TaskKind};
use crate::identity::domain::{Actor, Role, UserId};

/// Operation an actor intends to perform on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOperation {
    /// Create a task of the given kind.
    Create(TaskKind),
    /// Read a task.
    Read,
    /// Change the given fields.
    Update(FieldSet),
    /// Delete a task.
    Delete,
}

impl TaskOperation {
    const fn rule_operation(self) -> RuleOperation {
        match self {
            Self::Create(_) => RuleOperation::Create,
            Self::Read => RuleOperation::Read,
            Self::Update(_) => RuleOperation::Update,
            Self::Delete => RuleOperation::Delete,
        }
    }
}

/// Operation column of the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOperation {
    /// Task creation.
    Create,
    /// Task read.
    Read,
    /// Field update.
    Update,
    /// Task deletion.
    Delete,
}

/// Relation between an actor and an existing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The actor created the task.
    Creator,
    /// The actor is assigned to the task.
    Assignee,
}

/// Relation column of the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationRule {
    /// Matches regardless of relation, including when there is no task yet.
    Any,
    /// Matches only the given relation.
    Only(Relation),
}

/// Ownership facts of a task that permission rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSubject {
    /// Personal or project task.
    pub kind: TaskKind,
    /// Creator of the task.
    pub created_by: UserId,
    /// Assignee of the task.
    pub assigned_to: UserId,
}

impl PermissionSubject {
    /// Returns whether `user` holds `relation` to this task.
    #[must_use]
    pub fn holds(&self, user: UserId, relation: Relation) -> bool {
        match relation {
            Relation::Creator => self.created_by == user,
            Relation::Assignee => self.assigned_to == user,
        }
    }
}

impl From<&Task> for PermissionSubject {
    fn from(task: &Task) -> Self {
        Self {
            kind: task.kind(),
            created_by: task.created_by(),
            assigned_to: task.assigned_to(),
        }
    }
}

/// One row of the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRule {
    /// Role the row applies to.
    pub role: Role,
    /// Task kind the row applies to.
    pub kind: TaskKind,
    /// Required relation to the task.
    pub relation: RelationRule,
    /// Operation granted.
    pub operation: RuleOperation,
    /// Editable fields; only meaningful for [`RuleOperation::Update`].
    pub fields: FieldSet,
}

impl PermissionRule {
    const fn grant(
        role: Role,
        kind: TaskKind,
        relation: RelationRule,
        operation: RuleOperation,
    ) -> Self {
        Self {
            role,
            kind,
            relation,
            operation,
            fields: FieldSet::EMPTY,
        }
    }

    const fn update(role: Role, kind: TaskKind, relation: RelationRule, fields: FieldSet) -> Self {
        Self {
            role,
            kind,
            relation,
            operation: RuleOperation::Update,
            fields,
        }
    }

    fn matches(
        &self,
        actor: &Actor,
        kind: TaskKind,
        operation: RuleOperation,
        subject: Option<&PermissionSubject>,
    ) -> bool {
        if self.role != actor.role || self.kind != kind || self.operation != operation {
            return false;
        }
        match self.relation {
            RelationRule::Any => true,
            RelationRule::Only(relation) => {
                subject.is_some_and(|subject| subject.holds(actor.id, relation))
            }
        }
    }
}

const CREATOR: RelationRule = RelationRule::Only(Relation::Creator);
const ASSIGNEE: RelationRule = RelationRule::Only(Relation::Assignee);

/// Personal tasks always stay with their creator, so the assignee is fixed.
const PERSONAL_FIELDS: FieldSet = FieldSet::ALL.without(TaskField::Assignee);

const STATUS_ONLY: FieldSet = FieldSet::EMPTY.with(TaskField::Status);

/// The complete permission table. Anything not listed is denied.
pub const PERMISSION_TABLE: &[PermissionRule] = &[
    // Personal tasks: creator only, whatever the role.
    PermissionRule::grant(Role::Member, TaskKind::Personal, RelationRule::Any, RuleOperation::Create),
    PermissionRule::grant(Role::Member, TaskKind::Personal, CREATOR, RuleOperation::Read),
    PermissionRule::update(Role::Member, TaskKind::Personal, CREATOR, PERSONAL_FIELDS),
    PermissionRule::grant(Role::Member, TaskKind::Personal, CREATOR, RuleOperation::Delete),
    PermissionRule::grant(Role::Manager, TaskKind::Personal, CREATOR, RuleOperation::Read),
    PermissionRule::update(Role::Manager, TaskKind::Personal, CREATOR, PERSONAL_FIELDS),
    PermissionRule::grant(Role::Manager, TaskKind::Personal, CREATOR, RuleOperation::Delete),
    // Project tasks.
    PermissionRule::grant(Role::Manager, TaskKind::Project, RelationRule::Any, RuleOperation::Create),
    PermissionRule::grant(Role::Manager, TaskKind::Project, CREATOR, RuleOperation::Read),
    PermissionRule::update(Role::Manager, TaskKind::Project, CREATOR, FieldSet::ALL),
    PermissionRule::grant(Role::Manager, TaskKind::Project, CREATOR, RuleOperation::Delete),
    PermissionRule::grant(Role::Member, TaskKind::Project, ASSIGNEE, RuleOperation::Read),
    PermissionRule::update(Role::Member, TaskKind::Project, ASSIGNEE, STATUS_ONLY),
    PermissionRule::grant(Role::Admin, TaskKind::Project, RelationRule::Any, RuleOperation::Read),
];

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The actor's identity is deactivated.
    InactiveActor,
    /// An operation on an existing task was evaluated without the task.
    MissingSubject,
    /// No table row grants the operation.
    NoMatchingRule,
    /// The update names fields outside the granted set.
    FieldsNotPermitted(FieldSet),
}

/// Outcome of a permission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    /// The operation may proceed. For updates, `fields` is the full set the
    /// actor may change on this task.
    Allow {
        /// Fields the actor may edit.
        fields: FieldSet,
    },
    /// The operation is refused.
    Deny(DenialReason),
}

impl PermissionDecision {
    /// Returns whether the decision allows the operation.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Evaluates `operation` for `actor` against [`PERMISSION_TABLE`].
///
/// `subject` must be present for every operation except creation. Updates
/// are all-or-nothing: if any requested field falls outside the granted set
/// the whole request is denied.
#[must_use]
pub fn evaluate(
    actor: &Actor,
    operation: TaskOperation,
    subject: Option<&PermissionSubject>,
) -> PermissionDecision {
    if !actor.active {
        return PermissionDecision::Deny(DenialReason::InactiveActor);
    }
    let kind = match (operation, subject) {
        (TaskOperation::Create(kind), _) => kind,
        (_, Some(subject)) => subject.kind,
        (_, None) => return PermissionDecision::Deny(DenialReason::MissingSubject),
    };
    let rule_operation = operation.rule_operation();

    let mut matched = false;
    let mut granted = FieldSet::EMPTY;
    for rule in PERMISSION_TABLE
        .iter()
        .filter(|rule| rule.matches(actor, kind, rule_operation, subject))
    {
        matched = true;
        granted = granted.union(rule.fields);
    }
    if !matched {
        return PermissionDecision::Deny(DenialReason::NoMatchingRule);
    }

    if let TaskOperation::Update(requested) = operation
        && !requested.is_subset_of(granted)
    {
        return PermissionDecision::Deny(DenialReason::FieldsNotPermitted(
            requested.difference(granted),
        ));
    }
    PermissionDecision::Allow { fields: granted }
}
