//! Who may read a project's audit trail, and who may mutate a project.
//!
//! Reading the trail is a typed decision so the web layer can tell "sign in
//! first" apart from "not allowed".

use crate::types::{Actor, DbId};

/// Outcome of an audit-trail read check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    /// No authenticated actor; the caller should redirect to sign-in.
    Unauthenticated,
    Forbidden,
}

/// Decide whether `actor` may view the audit trail of the project owned by
/// `owner_id`.
///
/// Precedence: anonymous, admin, owner, pro, otherwise forbidden.
pub fn decide(actor: Option<&Actor>, owner_id: DbId) -> AccessDecision {
    let Some(actor) = actor else {
        return AccessDecision::Unauthenticated;
    };
    if actor.admin || actor.id == owner_id || actor.pro {
        AccessDecision::Allowed
    } else {
        AccessDecision::Forbidden
    }
}

pub fn can_view(actor: Option<&Actor>, owner_id: DbId) -> bool {
    decide(actor, owner_id) == AccessDecision::Allowed
}

/// Only the owner or an admin may update or delete a project.
pub fn can_modify(actor: &Actor, owner_id: DbId) -> bool {
    actor.admin || actor.id == owner_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const OWNER: DbId = 10;

    fn actor(id: DbId, admin: bool, pro: bool) -> Actor {
        Actor {
            id,
            name: format!("user{id}"),
            admin,
            pro,
        }
    }

    #[test]
    fn anonymous_must_sign_in() {
        assert_matches!(decide(None, OWNER), AccessDecision::Unauthenticated);
        assert!(!can_view(None, OWNER));
    }

    #[test]
    fn admin_is_allowed() {
        assert_matches!(decide(Some(&actor(1, true, false)), OWNER), AccessDecision::Allowed);
    }

    #[test]
    fn owner_is_allowed() {
        assert_matches!(decide(Some(&actor(OWNER, false, false)), OWNER), AccessDecision::Allowed);
    }

    #[test]
    fn pro_is_allowed() {
        assert_matches!(decide(Some(&actor(2, false, true)), OWNER), AccessDecision::Allowed);
    }

    #[test]
    fn plain_user_is_forbidden() {
        let user = actor(3, false, false);
        assert_matches!(decide(Some(&user), OWNER), AccessDecision::Forbidden);
        assert!(!can_view(Some(&user), OWNER));
    }

    #[test]
    fn pro_cannot_modify_foreign_project() {
        assert!(!can_modify(&actor(2, false, true), OWNER));
        assert!(can_modify(&actor(OWNER, false, false), OWNER));
        assert!(can_modify(&actor(1, true, false), OWNER));
    }
}
