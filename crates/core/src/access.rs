//! Access predicates and per-collection policies.
//!
//! A predicate is a pure function of the session principal (if any) and an
//! optional target id. Every collection has an [`AccessPolicy`] made of one
//! predicate per operation. Admin principals from the `users` realm pass
//! every policy.

use serde::{Deserialize, Serialize};

/// Which auth collection a principal was authenticated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Realm {
    /// Storefront shoppers.
    Customers,
    /// Back-office administrators.
    Users,
}

/// An authenticated caller.
///
/// The realm is part of identity: customer 7 and admin user 7 are different
/// principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub realm: Realm,
    pub id: i32,
}

impl Principal {
    /// A principal from the customers realm.
    #[must_use]
    pub const fn customer(id: i32) -> Self {
        Self {
            realm: Realm::Customers,
            id,
        }
    }

    /// A principal from the users (admin) realm.
    #[must_use]
    pub const fn admin(id: i32) -> Self {
        Self {
            realm: Realm::Users,
            id,
        }
    }
}

/// The operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

/// Inputs to an access predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessArgs<'a> {
    /// The session principal, if the caller is logged in.
    pub user: Option<&'a Principal>,
    /// The principal that owns the target record, if the operation has one.
    pub id: Option<Principal>,
}

impl<'a> AccessArgs<'a> {
    /// Args for an operation without a specific target.
    #[must_use]
    pub const fn new(user: Option<&'a Principal>) -> Self {
        Self { user, id: None }
    }

    /// Args for an operation on a record owned by `owner`.
    #[must_use]
    pub const fn with_target(user: Option<&'a Principal>, owner: Principal) -> Self {
        Self {
            user,
            id: Some(owner),
        }
    }
}

/// Always allows.
#[must_use]
pub const fn anyone(_args: &AccessArgs<'_>) -> bool {
    true
}

/// Allows any logged-in principal.
#[must_use]
pub const fn authenticated(args: &AccessArgs<'_>) -> bool {
    args.user.is_some()
}

/// Without a target, allows any logged-in principal. With a target, allows
/// only the principal that owns it.
#[must_use]
pub fn authenticated_or_self(args: &AccessArgs<'_>) -> bool {
    match (args.user, args.id) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(user), Some(target)) => *user == target,
    }
}

/// True when the caller is an admin user.
#[must_use]
pub fn is_admin(args: &AccessArgs<'_>) -> bool {
    args.user.is_some_and(|user| user.realm == Realm::Users)
}

/// Signature shared by all predicates.
pub type Predicate = fn(&AccessArgs<'_>) -> bool;

/// One predicate per operation for a collection.
#[derive(Clone, Copy)]
pub struct AccessPolicy {
    pub read: Predicate,
    pub create: Predicate,
    pub update: Predicate,
    pub delete: Predicate,
}

impl AccessPolicy {
    /// Customers may register themselves, and read or update only their own
    /// record.
    pub const CUSTOMERS: Self = Self {
        read: authenticated_or_self,
        create: anyone,
        update: authenticated_or_self,
        delete: authenticated,
    };

    /// Public catalog collections: products, categories, media.
    pub const CATALOG: Self = Self {
        read: anyone,
        create: authenticated,
        update: authenticated,
        delete: authenticated,
    };

    /// Orders are visible to and creatable by their owning customer.
    pub const ORDERS: Self = Self {
        read: authenticated_or_self,
        create: authenticated_or_self,
        update: authenticated,
        delete: authenticated,
    };

    /// Admin accounts.
    pub const USERS: Self = Self {
        read: authenticated,
        create: authenticated,
        update: authenticated,
        delete: authenticated,
    };

    /// Evaluate the policy for `op`.
    #[must_use]
    pub fn allows(&self, op: Operation, args: &AccessArgs<'_>) -> bool {
        if is_admin(args) {
            return true;
        }
        let rule = match op {
            Operation::Read => self.read,
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        };
        rule(args)
    }
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicy").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Principal = Principal::customer(1);
    const BOB: Principal = Principal::customer(2);
    const ADMIN: Principal = Principal::admin(1);

    #[test]
    fn test_authenticated_or_self_unauthenticated() {
        assert!(!authenticated_or_self(&AccessArgs::new(None)));
        assert!(!authenticated_or_self(&AccessArgs::with_target(None, ALICE)));
    }

    #[test]
    fn test_authenticated_or_self_without_target() {
        assert!(authenticated_or_self(&AccessArgs::new(Some(&ALICE))));
    }

    #[test]
    fn test_authenticated_or_self_with_target() {
        assert!(authenticated_or_self(&AccessArgs::with_target(
            Some(&ALICE),
            ALICE
        )));
        assert!(!authenticated_or_self(&AccessArgs::with_target(
            Some(&BOB),
            ALICE
        )));
    }

    #[test]
    fn test_realm_is_part_of_identity() {
        // Customer 1 and admin 1 share a numeric id but are not the same caller
        assert!(!authenticated_or_self(&AccessArgs::with_target(
            Some(&ADMIN),
            ALICE
        )));
    }

    #[test]
    fn test_anyone_and_authenticated() {
        assert!(anyone(&AccessArgs::new(None)));
        assert!(!authenticated(&AccessArgs::new(None)));
        assert!(authenticated(&AccessArgs::new(Some(&BOB))));
    }

    #[test]
    fn test_customer_policy() {
        let policy = AccessPolicy::CUSTOMERS;
        assert!(policy.allows(Operation::Create, &AccessArgs::new(None)));
        assert!(!policy.allows(
            Operation::Update,
            &AccessArgs::with_target(Some(&BOB), ALICE)
        ));
        assert!(policy.allows(
            Operation::Update,
            &AccessArgs::with_target(Some(&ALICE), ALICE)
        ));
    }

    #[test]
    fn test_admin_passes_every_policy() {
        for policy in [
            AccessPolicy::CUSTOMERS,
            AccessPolicy::CATALOG,
            AccessPolicy::ORDERS,
            AccessPolicy::USERS,
        ] {
            for op in [
                Operation::Read,
                Operation::Create,
                Operation::Update,
                Operation::Delete,
            ] {
                assert!(policy.allows(op, &AccessArgs::with_target(Some(&ADMIN), ALICE)));
            }
        }
    }

    #[test]
    fn test_catalog_reads_are_public() {
        let policy = AccessPolicy::CATALOG;
        assert!(policy.allows(Operation::Read, &AccessArgs::new(None)));
        assert!(!policy.allows(Operation::Create, &AccessArgs::new(None)));
    }
}
