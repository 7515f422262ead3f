//! Authorization gate for session admission.

use std::sync::Arc;

/// Decides whether a session ID may connect or be torn down.
///
/// Supplied by the embedding application. Implementations may block; callers
/// run them off the async executor.
pub trait Authorizer: Send + Sync + 'static {
    /// Return `true` to allow the session.
    fn authorize(&self, session_id: &str) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn authorize(&self, session_id: &str) -> bool {
        self(session_id)
    }
}

/// Shared, type-erased authorizer.
pub type SharedAuthorizer = Arc<dyn Authorizer>;
