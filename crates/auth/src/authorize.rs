use thiserror::Error;

use claimgate_core::ErrorCode;

use crate::{ClaimError, ClaimRequirement, HierarchySet, VerifiedToken};

/// Claim holding the numeric authorization tier.
pub const HIERARCHY_CLAIM: &str = "hierarchy";

/// Claim holding the role name (reported on hierarchy rejections).
pub const ROLE_CLAIM: &str = "role";

/// Claim holding the first-login flag.
pub const FIRST_LOGIN_CLAIM: &str = "first_login";

/// Detail returned to callers on every authorization failure. The real cause
/// is logged and audited only.
pub const PUBLIC_DETAIL: &str = "invalid token provided";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No verified token in the request context (absent or failed verification).
    #[error("cannot find verified token in request context")]
    MissingToken,

    #[error("claim set mismatch (missing: {missing:?}, unexpected: {unexpected:?})")]
    ClaimSetMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("unauthorized user hierarchy: {level}, with role {role}")]
    HierarchyNotAllowed { level: i64, role: String },

    #[error("first_login is {actual} but route requires {expected}")]
    FirstLoginMismatch { expected: bool, actual: bool },
}

impl AuthError {
    /// Every authorization failure surfaces with the same code.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::Unauthorized
    }
}

/// Exact claim-set equality: the token must carry every required key and
/// nothing else.
///
/// - No IO
/// - No panics
pub fn check_exact_claim_set(
    token: &VerifiedToken,
    required: &ClaimRequirement,
) -> Result<(), AuthError> {
    let admitted =
        token.len() == required.len() && token.claim_keys().all(|k| required.contains(k));
    if admitted {
        return Ok(());
    }

    let unexpected = token
        .claim_keys()
        .filter(|k| !required.contains(k))
        .map(str::to_string)
        .collect();
    let missing = required
        .iter()
        .filter(|k| !token.claims().contains_key(*k))
        .map(str::to_string)
        .collect();

    Err(AuthError::ClaimSetMismatch { missing, unexpected })
}

/// Request-scoped authorization decision, configured per route at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Route-specific scope list.
    AccessToken(ClaimRequirement),
    /// The service-wide refresh-token claim list.
    RefreshToken(ClaimRequirement),
    /// Allowed `hierarchy` levels.
    Hierarchy(HierarchySet),
    /// Expected value of the `first_login` flag.
    FirstLogin(bool),
}

impl Guard {
    /// Caller-visible reason attached to rejections.
    pub fn reason(&self) -> &'static str {
        match self {
            Guard::AccessToken(_) => "requires access token",
            Guard::RefreshToken(_) => "requires refresh token",
            Guard::Hierarchy(_) => "requires hierarchy",
            Guard::FirstLogin(_) => "requires first login",
        }
    }

    /// Admit or reject the request's token.
    ///
    /// A missing token is rejected exactly like an invalid one.
    pub fn check(&self, token: Option<&VerifiedToken>) -> Result<(), AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;

        match self {
            Guard::AccessToken(required) | Guard::RefreshToken(required) => {
                check_exact_claim_set(token, required)
            }
            Guard::Hierarchy(allowed) => {
                let level = token.claim_i64(HIERARCHY_CLAIM)?;
                if allowed.contains(level) {
                    Ok(())
                } else {
                    let role = token.claim_str(ROLE_CLAIM).unwrap_or("<none>").to_string();
                    Err(AuthError::HierarchyNotAllowed { level, role })
                }
            }
            Guard::FirstLogin(expected) => {
                let actual = token.claim_bool(FIRST_LOGIN_CLAIM)?;
                if actual == *expected {
                    Ok(())
                } else {
                    Err(AuthError::FirstLoginMismatch {
                        expected: *expected,
                        actual,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Value, json};
    use std::collections::BTreeSet;

    fn token(v: Value) -> VerifiedToken {
        serde_json::from_value(v).unwrap()
    }

    fn access(claims: &[&str]) -> Guard {
        Guard::AccessToken(ClaimRequirement::new(claims.iter().copied()))
    }

    #[test]
    fn superset_token_is_rejected() {
        let guard = access(&["sub", "org", "role"]);
        let t = token(json!({"sub": "u1", "org": "o1", "role": "admin", "extra": "x"}));

        let err = guard.check(Some(&t)).unwrap_err();
        assert_eq!(
            err,
            AuthError::ClaimSetMismatch {
                missing: vec![],
                unexpected: vec!["extra".into()],
            }
        );
        assert_eq!(err.error_code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn exact_token_is_admitted() {
        let guard = access(&["sub", "org", "role"]);
        let t = token(json!({"sub": "u1", "org": "o1", "role": "admin"}));
        assert!(guard.check(Some(&t)).is_ok());
    }

    #[test]
    fn subset_token_is_rejected() {
        let guard = access(&["sub", "org", "role"]);
        let t = token(json!({"sub": "u1", "org": "o1"}));
        assert_eq!(
            guard.check(Some(&t)).unwrap_err(),
            AuthError::ClaimSetMismatch {
                missing: vec!["role".into()],
                unexpected: vec![],
            }
        );
    }

    #[test]
    fn same_size_different_keys_is_rejected() {
        let guard = Guard::RefreshToken(ClaimRequirement::new(["sub", "exp"]));
        let t = token(json!({"sub": "u1", "org": "o1"}));
        assert!(matches!(
            guard.check(Some(&t)),
            Err(AuthError::ClaimSetMismatch { .. })
        ));
    }

    #[test]
    fn missing_token_is_rejected_by_every_guard() {
        let guards = [
            access(&["sub"]),
            Guard::RefreshToken(ClaimRequirement::new(["sub"])),
            Guard::Hierarchy(HierarchySet::new([1])),
            Guard::FirstLogin(true),
        ];
        for guard in guards {
            assert_eq!(guard.check(None).unwrap_err(), AuthError::MissingToken);
        }
    }

    #[test]
    fn hierarchy_membership() {
        let guard = Guard::Hierarchy(HierarchySet::new([1, 2]));

        assert!(guard.check(Some(&token(json!({"hierarchy": 2, "role": "admin"})))).is_ok());
        assert_eq!(
            guard
                .check(Some(&token(json!({"hierarchy": 5, "role": "viewer"}))))
                .unwrap_err(),
            AuthError::HierarchyNotAllowed { level: 5, role: "viewer".into() }
        );
    }

    #[test]
    fn absent_or_non_numeric_hierarchy_rejects() {
        let guard = Guard::Hierarchy(HierarchySet::new([1]));
        assert!(matches!(
            guard.check(Some(&token(json!({"role": "admin"})))),
            Err(AuthError::Claim(ClaimError::Missing { .. }))
        ));
        assert!(matches!(
            guard.check(Some(&token(json!({"hierarchy": "high"})))),
            Err(AuthError::Claim(ClaimError::TypeMismatch { .. }))
        ));
        assert!(matches!(
            guard.check(Some(&token(json!({"hierarchy": [1]})))),
            Err(AuthError::Claim(ClaimError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn string_hierarchy_is_rejected_even_when_it_names_an_allowed_level() {
        let guard = Guard::Hierarchy(HierarchySet::new([2]));
        for level in ["2", " 2 "] {
            let t = token(json!({"hierarchy": level, "role": "admin"}));
            assert!(matches!(
                guard.check(Some(&t)),
                Err(AuthError::Claim(ClaimError::TypeMismatch { .. }))
            ));
        }
    }

    #[test]
    fn json_boolean_first_login_is_rejected() {
        let guard = Guard::FirstLogin(true);
        assert!(matches!(
            guard.check(Some(&token(json!({"first_login": true})))),
            Err(AuthError::Claim(ClaimError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn first_login_guard() {
        let guard = Guard::FirstLogin(true);

        assert!(guard.check(Some(&token(json!({"first_login": "true"})))).is_ok());
        assert_eq!(
            guard.check(Some(&token(json!({"first_login": "false"})))).unwrap_err(),
            AuthError::FirstLoginMismatch { expected: true, actual: false }
        );
        assert!(matches!(
            guard.check(Some(&token(json!({"first_login": "maybe"})))),
            Err(AuthError::Claim(ClaimError::Malformed { .. }))
        ));
    }

    #[test]
    fn reasons_name_the_guard() {
        assert_eq!(access(&[]).reason(), "requires access token");
        assert_eq!(Guard::FirstLogin(false).reason(), "requires first login");
    }

    fn key() -> impl Strategy<Value = String> {
        "[a-z_]{1,8}"
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the guard admits iff keys(token) == set(requirement).
        #[test]
        fn admits_iff_key_sets_are_equal(
            required in prop::collection::btree_set(key(), 0..6),
            present in prop::collection::btree_set(key(), 0..6),
        ) {
            let guard = Guard::AccessToken(ClaimRequirement::new(required.iter().cloned()));
            let t = VerifiedToken::from_claims(present.iter().map(|k| (k.clone(), json!("v"))));

            prop_assert_eq!(guard.check(Some(&t)).is_ok(), present == required);
        }

        #[test]
        fn proper_subsets_and_supersets_are_rejected(
            required in prop::collection::btree_set(key(), 1..6),
            extra in key(),
        ) {
            let guard = Guard::AccessToken(ClaimRequirement::new(required.iter().cloned()));

            let mut subset: BTreeSet<String> = required.clone();
            let first = subset.iter().next().cloned().unwrap();
            subset.remove(&first);
            let sub = VerifiedToken::from_claims(subset.into_iter().map(|k| (k, json!(1))));
            prop_assert!(guard.check(Some(&sub)).is_err());

            prop_assume!(!required.contains(&extra));
            let sup = VerifiedToken::from_claims(
                required.iter().cloned().chain(std::iter::once(extra)).map(|k| (k, json!(1))),
            );
            prop_assert!(guard.check(Some(&sup)).is_err());

            let exact = VerifiedToken::from_claims(required.iter().cloned().map(|k| (k, json!(1))));
            prop_assert!(guard.check(Some(&exact)).is_ok());
        }

        #[test]
        fn hierarchy_admits_iff_member(
            allowed in prop::collection::vec(-5i64..20, 0..6),
            level in -5i64..20,
        ) {
            let guard = Guard::Hierarchy(HierarchySet::new(allowed.iter().copied()));
            let t = token(json!({"hierarchy": level, "role": "r"}));
            prop_assert_eq!(guard.check(Some(&t)).is_ok(), allowed.contains(&level));
        }
    }
}
