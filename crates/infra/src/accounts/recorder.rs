use std::sync::Arc;

use rxconsole_auth::{Activity, ActivityAction, NewActivity};
use rxconsole_core::UserId;

use super::{AccountError, AccountResult};
use crate::repository::AccountRepository;

/// Appends audit entries for account-affecting actions.
///
/// Recording is synchronous with the triggering action. A failed write is
/// returned as [`AccountError::Audit`] so the gap is never silent.
#[derive(Clone)]
pub struct ActivityRecorder {
    repo: Arc<dyn AccountRepository>,
}

impl ActivityRecorder {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(
        &self,
        user_id: Option<UserId>,
        action: ActivityAction,
        description: impl Into<String>,
    ) -> AccountResult<Activity> {
        let new = NewActivity {
            user_id,
            action,
            description: description.into(),
        };

        match self.repo.create_activity(new.clone()).await {
            Ok(activity) => {
                tracing::debug!(activity_id = %activity.id, action = %activity.action, "activity recorded");
                Ok(activity)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    action = %new.action,
                    user_id = ?new.user_id,
                    description = %new.description,
                    "failed to record activity"
                );
                Err(AccountError::Audit(e.to_string()))
            }
        }
    }
}
