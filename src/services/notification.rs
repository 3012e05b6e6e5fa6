use std::collections::HashMap;

use async_trait::async_trait;

use crate::{config::Config, errors::AppResult, models::domain::User};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    EmailVerification,
    CertificationPassed,
    PasswordReset,
}

impl NotificationKind {
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationKind::EmailVerification => "Verify your email address",
            NotificationKind::CertificationPassed => "Congratulations, you are certified",
            NotificationKind::PasswordReset => "Reset your password",
        }
    }
}

pub type NotificationContext = HashMap<String, String>;

/// Outbound messages to users. Delivery is left to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user: &User,
        kind: NotificationKind,
        context: NotificationContext,
    ) -> AppResult<()>;
}

/// Records each dispatch through the log facade instead of sending mail.
pub struct LogNotifier {
    from_address: String,
    base_url: String,
}

impl LogNotifier {
    pub fn new(config: &Config) -> Self {
        Self {
            from_address: config.mail_from_address.clone(),
            base_url: config.app_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn link_for(&self, kind: NotificationKind, context: &NotificationContext) -> Option<String> {
        let token = context.get("token")?;
        let path = match kind {
            NotificationKind::EmailVerification => "/api/auth/verify-email/",
            NotificationKind::PasswordReset => "/reset-password?token=",
            NotificationKind::CertificationPassed => return None,
        };
        Some(format!("{}{}{}", self.base_url, path, token))
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        user: &User,
        kind: NotificationKind,
        context: NotificationContext,
    ) -> AppResult<()> {
        match self.link_for(kind, &context) {
            Some(link) => log::info!(
                "[NOTIFICATION] {:?} from={} to={} subject=\"{}\" link={}",
                kind,
                self.from_address,
                user.email,
                kind.subject(),
                link
            ),
            None => log::info!(
                "[NOTIFICATION] {:?} from={} to={} subject=\"{}\"",
                kind,
                self.from_address,
                user.email,
                kind.subject()
            ),
        }
        Ok(())
    }
}
