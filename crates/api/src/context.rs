use rxconsole_core::UserId;

/// Session context for a request: the authenticated user id.
///
/// Inserted by the auth middleware. The role is deliberately absent: handlers
/// re-read the user so role changes apply on the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    user_id: UserId,
}

impl SessionContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
