//! Role definitions and the allow/deny combination algebra
//!
//! A role is a predicate over field names used to select the active subset
//! of fields for one marshal/serialize call. Roles come in two modes:
//! *allow* (membership passes iff the field is listed) and *deny*
//! (membership passes iff the field is not listed). Combining mixed modes is
//! asymmetric, so the combinators are explicit named functions rather than
//! operator overloads.

use std::collections::BTreeSet;

/// Whether listed members are the permitted set or the excluded set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleMode {
    Allow,
    Deny,
}

/// A predicate over field names selecting the active fields for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    mode: RoleMode,
    members: BTreeSet<String>,
}

impl Role {
    /// An allow-role permitting exactly the listed fields.
    pub fn allow<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Role {
            mode: RoleMode::Allow,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// A deny-role permitting everything except the listed fields.
    pub fn deny<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Role {
            mode: RoleMode::Deny,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// The synthesized default role: deny nothing, i.e. all fields active.
    pub fn all_fields() -> Self {
        Role::deny(Vec::<String>::new())
    }

    pub fn mode(&self) -> RoleMode {
        self.mode
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Membership test: does this role select the given field?
    pub fn membership(&self, field_id: &str) -> bool {
        match self.mode {
            RoleMode::Allow => self.members.contains(field_id),
            RoleMode::Deny => !self.members.contains(field_id),
        }
    }
}

/// Union of two roles.
///
/// - Allow ∪ Allow → Allow(A ∪ B)
/// - Allow ∪ Deny  → Allow(A − B)
/// - Deny ∪ Allow  → Allow(B − A)
/// - Deny ∪ Deny   → Deny(A ∪ B)
pub fn role_union(a: &Role, b: &Role) -> Role {
    match (a.mode, b.mode) {
        (RoleMode::Allow, RoleMode::Allow) => Role {
            mode: RoleMode::Allow,
            members: a.members.union(&b.members).cloned().collect(),
        },
        (RoleMode::Allow, RoleMode::Deny) => Role {
            mode: RoleMode::Allow,
            members: a.members.difference(&b.members).cloned().collect(),
        },
        (RoleMode::Deny, RoleMode::Allow) => Role {
            mode: RoleMode::Allow,
            members: b.members.difference(&a.members).cloned().collect(),
        },
        (RoleMode::Deny, RoleMode::Deny) => Role {
            mode: RoleMode::Deny,
            members: a.members.union(&b.members).cloned().collect(),
        },
    }
}

/// Intersection of two roles.
///
/// Mirrors the union with ∩ substituted in the same-mode cases and
/// subtraction retained for the mixed cases.
pub fn role_intersect(a: &Role, b: &Role) -> Role {
    match (a.mode, b.mode) {
        (RoleMode::Allow, RoleMode::Allow) => Role {
            mode: RoleMode::Allow,
            members: a.members.intersection(&b.members).cloned().collect(),
        },
        (RoleMode::Allow, RoleMode::Deny) => Role {
            mode: RoleMode::Allow,
            members: a.members.difference(&b.members).cloned().collect(),
        },
        (RoleMode::Deny, RoleMode::Allow) => Role {
            mode: RoleMode::Allow,
            members: b.members.difference(&a.members).cloned().collect(),
        },
        (RoleMode::Deny, RoleMode::Deny) => Role {
            mode: RoleMode::Deny,
            members: a.members.intersection(&b.members).cloned().collect(),
        },
    }
}
