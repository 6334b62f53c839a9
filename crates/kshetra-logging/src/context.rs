//! User context for log correlation
//!
//! Provides thread-local storage of the signed-in user so every span and
//! event can be tagged with who was navigating and under which grant.

use std::cell::RefCell;

use kshetra_core::{AuthContext, RegionId};
use uuid::Uuid;

thread_local! {
    static USER_CONTEXT: RefCell<Option<UserContextData>> = const { RefCell::new(None) };
}

/// Data stored in the user context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContextData {
    /// User identifier, `anonymous` when the auth source has none
    pub user_id: String,
    /// Display form of the user's grant
    pub grant: String,
    /// Region the user is assigned to
    pub assigned_region: Option<RegionId>,
    /// Identifies one navigation session
    pub session_id: Uuid,
}

impl UserContextData {
    pub fn from_auth(auth: &dyn AuthContext) -> Self {
        Self {
            user_id: auth.user_id().unwrap_or_else(|| "anonymous".to_string()),
            grant: auth.grant().to_string(),
            assigned_region: auth.assigned_region(),
            session_id: Uuid::new_v4(),
        }
    }
}

/// RAII guard that sets user context for the current thread
///
/// The previous context is restored on drop, so guards nest.
pub struct UserContextGuard {
    previous: Option<UserContextData>,
}

impl UserContextGuard {
    /// Set the context from an auth source with a fresh session id
    pub fn new(auth: &dyn AuthContext) -> Self {
        Self::with_data(UserContextData::from_auth(auth))
    }

    /// Set an explicit context
    pub fn with_data(data: UserContextData) -> Self {
        let previous = USER_CONTEXT.with(|ctx| ctx.borrow_mut().replace(data));
        Self { previous }
    }

    /// Get the current user context for this thread
    pub fn current() -> Option<UserContextData> {
        USER_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_user_id() -> Option<String> {
        USER_CONTEXT.with(|ctx| ctx.borrow().as_ref().map(|c| c.user_id.clone()))
    }

    pub fn current_session_id() -> Option<Uuid> {
        USER_CONTEXT.with(|ctx| ctx.borrow().as_ref().map(|c| c.session_id))
    }
}

impl Drop for UserContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        USER_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = previous;
        });
    }
}

/// Span carrying the user's fields, for instrumenting async work that may
/// leave the current thread
pub fn user_span(data: &UserContextData) -> tracing::Span {
    tracing::info_span!(
        "user",
        user_id = %data.user_id,
        grant = %data.grant,
        assigned_region = ?data.assigned_region.map(|r| r.get()),
        session_id = %data.session_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kshetra_core::{AccessLevel, Role, StaticAuth};

    #[test]
    fn test_guard_sets_context() {
        assert!(UserContextGuard::current().is_none());
        let auth = StaticAuth::new(Some(RegionId(3)), Role::JilaKaryakarta).with_user_id("u-17");
        {
            let _guard = UserContextGuard::new(&auth);
            let ctx = UserContextGuard::current().unwrap();
            assert_eq!(ctx.user_id, "u-17");
            assert_eq!(ctx.assigned_region, Some(RegionId(3)));
            assert_eq!(ctx.grant, Role::JilaKaryakarta.to_string());
            assert_eq!(UserContextGuard::current_session_id(), Some(ctx.session_id));
        }
        assert!(UserContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_guards_restore() {
        let outer = StaticAuth::new(None, Role::Admin).with_user_id("admin");
        let inner = StaticAuth::new(Some(RegionId(9)), AccessLevel::ViewOnly);

        let _outer = UserContextGuard::new(&outer);
        assert_eq!(UserContextGuard::current_user_id().as_deref(), Some("admin"));
        {
            let _inner = UserContextGuard::new(&inner);
            assert_eq!(
                UserContextGuard::current_user_id().as_deref(),
                Some("anonymous")
            );
        }
        assert_eq!(UserContextGuard::current_user_id().as_deref(), Some("admin"));
    }

    #[test]
    fn test_sessions_are_distinct() {
        let auth = StaticAuth::new(None, AccessLevel::ToliCreation);
        let a = UserContextData::from_auth(&auth);
        let b = UserContextData::from_auth(&auth);
        assert_ne!(a.session_id, b.session_id);
    }
}
