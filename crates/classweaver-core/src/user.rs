//! User profile and session state domain models.

use serde::{Deserialize, Serialize};

/// Authenticated user profile as returned by the backend.
///
/// This is an immutable value: a successful auth call replaces it wholesale,
/// it is never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable, unique user identifier.
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    /// Returns true when the identity field is usable.
    ///
    /// A persisted snapshot that fails this check is treated as corrupt and
    /// discarded rather than restored.
    pub fn has_valid_identity(&self) -> bool {
        self.id > 0
    }
}

/// Credentials for an explicit sign-in call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Payload for a registration call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Process-wide authentication state.
///
/// Exactly one instance exists per client session, owned by the session
/// service and mutated only through its operations.
///
/// `initialized` distinguishes "not yet checked" from "checked, not
/// authenticated": it transitions false -> true exactly once per session
/// (or per forced refresh) and never reverts.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Currently authenticated user, if any.
    pub current_user: Option<UserProfile>,
    /// True while an auth-related network call is in flight.
    pub loading: bool,
    /// True once the session has been checked at least once.
    pub initialized: bool,
    /// Display message from the last failed sign-in/sign-up, if any.
    pub last_error: Option<String>,
}

impl SessionState {
    /// Creates an unauthenticated, unchecked state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a user is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_unauthenticated() {
        let state = SessionState::new();
        assert!(!state.is_authenticated());
        assert!(!state.initialized);
        assert!(!state.loading);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_identity_validation() {
        let user = UserProfile {
            id: 7,
            username: "ada".to_string(),
            email: None,
        };
        assert!(user.has_valid_identity());

        let corrupt = UserProfile {
            id: 0,
            username: "ghost".to_string(),
            email: None,
        };
        assert!(!corrupt.has_valid_identity());
    }

    #[test]
    fn test_profile_round_trips_without_email() {
        let raw = r#"{"id":3,"username":"ada"}"#;
        let user: UserProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(user.email, None);
        let out = serde_json::to_string(&user).unwrap();
        assert!(!out.contains("email"));
    }
}
