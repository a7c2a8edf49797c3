//! Authorization Gate: a pure rule table mapping (actor capabilities, action)
//! to allow or deny.
//!
//! Callers gather the capability set first (resolved actor, the actor's role
//! in the target group, authorship of the target idea, the group's access
//! level) and ask the gate. The gate never touches storage.

use crate::error::TalkError;
use serde::{Deserialize, Serialize};
use talk_types::{AccessLevel, Actor, Role};
use tracing::warn;

/// Every action the gate arbitrates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateGroup,
    CreateSubGroup,
    UpdateGroup,
    DeleteGroup,
    JoinGroup,
    LeaveGroup,
    UpdateMember,
    SaveIdea,
    EditIdea,
    DeleteIdea,
    PromoteIdea,
    ToggleShareable,
    CreateLink,
    GetLinks,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateGroup => "create_group",
            Action::CreateSubGroup => "create_sub_group",
            Action::UpdateGroup => "update_group",
            Action::DeleteGroup => "delete_group",
            Action::JoinGroup => "join_group",
            Action::LeaveGroup => "leave_group",
            Action::UpdateMember => "update_member",
            Action::SaveIdea => "save",
            Action::EditIdea => "edit",
            Action::DeleteIdea => "delete",
            Action::PromoteIdea => "promote",
            Action::ToggleShareable => "toggle_shareable",
            Action::CreateLink => "create_link",
            Action::GetLinks => "get_links",
        }
    }

    /// The requirement an actor must meet for this action
    pub fn rule(&self) -> Rule {
        match self {
            Action::CreateGroup | Action::CreateLink | Action::GetLinks => Rule::Authenticated,
            Action::CreateSubGroup
            | Action::UpdateGroup
            | Action::DeleteGroup
            | Action::UpdateMember => Rule::Facilitator,
            Action::JoinGroup => Rule::Joinable,
            Action::LeaveGroup => Rule::Member,
            Action::SaveIdea => Rule::Contributor,
            Action::EditIdea
            | Action::DeleteIdea
            | Action::PromoteIdea
            | Action::ToggleShareable => Rule::Author,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requirement classes of the rule table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Any resolved actor
    Authenticated,
    /// Facilitator of the target group
    Facilitator,
    /// Target group is open and the actor holds no membership yet
    Joinable,
    /// Any membership in the target group
    Member,
    /// Facilitator or member of the target group
    Contributor,
    /// Author of the target idea
    Author,
}

/// What the gate knows about the actor relative to the target
#[derive(Clone, Copy, Debug, Default)]
pub struct Capabilities {
    pub actor: Actor,
    /// Actor's role in the target group, if any
    pub role: Option<Role>,
    /// Actor wrote the target idea
    pub is_author: bool,
    /// Access level of the target group, if the action is group-scoped
    pub access_level: Option<AccessLevel>,
}

impl Capabilities {
    pub fn of(actor: Actor) -> Self {
        Self {
            actor,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    pub fn with_authorship(mut self, is_author: bool) -> Self {
        self.is_author = is_author;
        self
    }

    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = Some(access_level);
        self
    }
}

/// Why the gate said no
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden(String),
    AlreadyMember,
    NotMember,
}

/// Gate verdict
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(Denial),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }
}

/// Evaluate the rule table.
pub fn check(action: Action, caps: &Capabilities) -> GateDecision {
    if !caps.actor.is_authenticated() {
        return GateDecision::Deny(Denial::Unauthenticated);
    }

    let forbid = |why: &str| GateDecision::Deny(Denial::Forbidden(format!("{action}: {why}")));

    match action.rule() {
        Rule::Authenticated => GateDecision::Allow,
        Rule::Facilitator => match caps.role {
            Some(role) if role.is_facilitator() => GateDecision::Allow,
            _ => forbid("facilitator role required"),
        },
        Rule::Joinable => match (caps.role, caps.access_level) {
            (Some(_), _) => GateDecision::Deny(Denial::AlreadyMember),
            (None, Some(level)) if level.is_open() => GateDecision::Allow,
            (None, _) => forbid("group is closed"),
        },
        Rule::Member => match caps.role {
            Some(_) => GateDecision::Allow,
            None => GateDecision::Deny(Denial::NotMember),
        },
        Rule::Contributor => match caps.role {
            Some(role) if role.can_author() => GateDecision::Allow,
            Some(_) => forbid("observers cannot contribute ideas"),
            None => forbid("group membership required"),
        },
        Rule::Author => {
            if caps.is_author {
                GateDecision::Allow
            } else {
                forbid("only the author may do this")
            }
        }
    }
}

/// Check and convert a denial into the error taxonomy, logging it.
pub fn enforce(action: Action, caps: &Capabilities) -> Result<(), TalkError> {
    match check(action, caps) {
        GateDecision::Allow => Ok(()),
        GateDecision::Deny(denial) => {
            warn!(action = %action, actor = %caps.actor, ?denial, "action denied");
            Err(match denial {
                Denial::Unauthenticated => TalkError::authentication(),
                Denial::Forbidden(reason) => TalkError::Authorization(reason),
                Denial::AlreadyMember => {
                    TalkError::Conflict("already a member of this group".into())
                }
                Denial::NotMember => TalkError::not_found("not a member of this group"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Actor {
        Actor::user(7)
    }

    #[test]
    fn anonymous_is_always_denied() {
        for action in [
            Action::CreateGroup,
            Action::JoinGroup,
            Action::SaveIdea,
            Action::GetLinks,
        ] {
            let caps = Capabilities::of(Actor::Anonymous)
                .with_role(Some(Role::Facilitator))
                .with_authorship(true)
                .with_access_level(AccessLevel::Open);
            assert_eq!(
                check(action, &caps),
                GateDecision::Deny(Denial::Unauthenticated)
            );
        }
    }

    #[test]
    fn facilitator_actions() {
        let member = Capabilities::of(user()).with_role(Some(Role::Member));
        let facilitator = Capabilities::of(user()).with_role(Some(Role::Facilitator));
        for action in [Action::UpdateGroup, Action::UpdateMember, Action::DeleteGroup] {
            assert!(check(action, &member).is_denied());
            assert!(check(action, &facilitator).is_allowed());
        }
    }

    #[test]
    fn join_rules() {
        let open = Capabilities::of(user()).with_access_level(AccessLevel::Open);
        let closed = Capabilities::of(user()).with_access_level(AccessLevel::Closed);
        assert!(check(Action::JoinGroup, &open).is_allowed());
        assert!(matches!(
            check(Action::JoinGroup, &closed),
            GateDecision::Deny(Denial::Forbidden(_))
        ));
        assert_eq!(
            check(Action::JoinGroup, &open.with_role(Some(Role::Observer))),
            GateDecision::Deny(Denial::AlreadyMember)
        );
    }

    #[test]
    fn observers_cannot_save() {
        let observer = Capabilities::of(user()).with_role(Some(Role::Observer));
        assert!(check(Action::SaveIdea, &observer).is_denied());
        assert!(check(Action::SaveIdea, &Capabilities::of(user())).is_denied());
        let member = Capabilities::of(user()).with_role(Some(Role::Member));
        assert!(check(Action::SaveIdea, &member).is_allowed());
    }

    #[test]
    fn authorship_ignores_role() {
        let facilitator = Capabilities::of(user()).with_role(Some(Role::Facilitator));
        assert!(check(Action::EditIdea, &facilitator).is_denied());
        assert!(check(Action::PromoteIdea, &facilitator.with_authorship(true)).is_allowed());
    }

    #[test]
    fn enforce_maps_denials() {
        let err = enforce(Action::LeaveGroup, &Capabilities::of(user())).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        let err = enforce(Action::EditIdea, &Capabilities::of(user())).unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
        let err = enforce(Action::CreateGroup, &Capabilities::default()).unwrap_err();
        assert_eq!(err.code(), "AUTHENTICATION_REQUIRED");
    }
}
