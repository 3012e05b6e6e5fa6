use std::{collections::HashMap, sync::Arc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AssessmentAttempt, Certification},
    repositories::{CertificationRepository, UserRepository},
    services::notification::{NotificationKind, Notifier},
};

pub struct CertificationService {
    certifications: Arc<dyn CertificationRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
}

impl CertificationService {
    pub fn new(
        certifications: Arc<dyn CertificationRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            certifications,
            users,
            notifier,
        }
    }

    /// Applies a finalized attempt to the user's certification. A pass
    /// certifies the user, a fail leaves certification as it was. Returns
    /// `true` when this call is the one that certified the user.
    ///
    /// Safe to repeat for the same attempt: the account flag is written on
    /// every pass, the notice only on the transition.
    pub async fn apply_result(&self, user_id: &str, attempt: &AssessmentAttempt) -> AppResult<bool> {
        if attempt.user_id != user_id {
            return Err(AppError::Forbidden(
                "Attempt belongs to another user".to_string(),
            ));
        }
        let completed_at = match (attempt.is_completed(), attempt.completed_at) {
            (true, Some(at)) => at,
            _ => {
                return Err(AppError::AttemptNotActive(format!(
                    "attempt '{}' has not been finalized",
                    attempt.id
                )))
            }
        };
        let score = attempt.score_percentage.unwrap_or_default();

        if !attempt.passed {
            log::info!(
                "[ASSESSMENT_FAILED] user={} attempt={} score={}% threshold={}%",
                user_id,
                attempt.id,
                score,
                attempt.passing_threshold
            );
            return Ok(false);
        }

        log::info!(
            "[ASSESSMENT_PASSED] user={} attempt={} score={}% threshold={}%",
            user_id,
            attempt.id,
            score,
            attempt.passing_threshold
        );

        // before certify, so a retry after a failed certify write still notifies
        self.users.mark_certified(user_id, completed_at).await?;
        let newly_certified = self
            .certifications
            .certify(user_id, &attempt.id, completed_at)
            .await?;
        if !newly_certified {
            return Ok(false);
        }

        log::info!(
            "[CERTIFICATION_EARNED] user={} attempt={} at={}",
            user_id,
            attempt.id,
            completed_at
        );

        match self.users.find_by_id(user_id).await? {
            Some(user) => {
                let context = HashMap::from([
                    ("attempt_id".to_string(), attempt.id.clone()),
                    ("score".to_string(), score.to_string()),
                ]);
                if let Err(err) = self
                    .notifier
                    .notify(&user, NotificationKind::CertificationPassed, context)
                    .await
                {
                    log::warn!(
                        "Certification notice for user {} was not sent: {}",
                        user_id,
                        err
                    );
                }
            }
            None => log::warn!("Certified user {} has no account record", user_id),
        }

        Ok(true)
    }

    pub async fn status(&self, user_id: &str) -> AppResult<Certification> {
        let certification = self
            .certifications
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| Certification::uncertified(user_id));
        Ok(certification)
    }

    pub async fn can_view_schedule(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.status(user_id).await?.is_certified)
    }
}
