use async_graphql::Enum;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_FAILED_LOGINS: u32 = 5;
pub const LOCKOUT_MINUTES: i64 = 30;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub email: String, // unique, stored lowercased
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub city: String,
    pub state_region: String,
    pub date_of_birth: NaiveDate,
    pub password_hash: String,
    #[serde(default)]
    pub role: UserRole,
    pub is_email_verified: bool,
    pub is_certified: bool, // written only by the certification engine
    pub certified_at: Option<DateTime<Utc>>,
    pub failed_login_attempts: u32,
    pub account_locked_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: &str,
        city: &str,
        state_region: &str,
        date_of_birth: NaiveDate,
        password_hash: String,
    ) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            phone_number: phone_number.to_string(),
            city: city.trim().to_string(),
            state_region: state_region.trim().to_string(),
            date_of_birth,
            password_hash,
            role: UserRole::User,
            is_email_verified: false,
            is_certified: false,
            certified_at: None,
            failed_login_attempts: 0,
            account_locked_until: None,
            last_login: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Remaining lockout, if the account is currently locked at `now`.
    pub fn lockout_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.account_locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    pub fn record_failed_login(&mut self, now: DateTime<Utc>) {
        if self.account_locked_until.is_some_and(|until| until <= now) {
            self.failed_login_attempts = 0;
            self.account_locked_until = None;
        }
        self.failed_login_attempts += 1;
        if self.failed_login_attempts >= MAX_FAILED_LOGINS {
            self.account_locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
        }
    }

    pub fn record_successful_login(&mut self, now: DateTime<Utc>) {
        self.failed_login_attempts = 0;
        self.account_locked_until = None;
        self.last_login = Some(now);
    }

    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_on(self.date_of_birth, today)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(date_of_birth).unwrap_or(0)
}

#[cfg(test)]
impl User {
    pub fn test_user(email: &str) -> Self {
        User::new(
            "Test",
            "User",
            email,
            "+12025551234",
            "Springfield",
            "IL",
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            "$argon2id$placeholder".to_string(),
        )
    }
}
