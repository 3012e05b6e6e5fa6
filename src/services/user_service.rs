use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    auth::{
        password::{check_password_strength, hash_password, verify_password},
        JwtService,
    },
    errors::{AppError, AppResult},
    models::{
        domain::{
            account_token::hash_token,
            user::{age_on, normalize_email},
            AccountToken, TokenKind, User,
        },
        dto::{
            request::{LoginRequest, RegisterRequest, ResetPasswordRequest},
            response::{AuthResponse, UserDto},
        },
    },
    repositories::{AccountTokenRepository, UserRepository},
    services::notification::{NotificationKind, Notifier},
};

pub const MINIMUM_AGE: u32 = 18;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn AccountTokenRepository>,
    notifier: Arc<dyn Notifier>,
    jwt: Arc<JwtService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn AccountTokenRepository>,
        notifier: Arc<dyn Notifier>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            users,
            tokens,
            notifier,
            jwt,
        }
    }

    pub async fn register(&self, request: RegisterRequest, now: DateTime<Utc>) -> AppResult<UserDto> {
        request.validate()?;
        check_password_strength(&request.password)?;

        if age_on(request.date_of_birth, now.date_naive()) < MINIMUM_AGE {
            return Err(AppError::ValidationError(format!(
                "You must be at least {} years old to register",
                MINIMUM_AGE
            )));
        }

        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                email
            )));
        }

        let password_hash = hash_password(&request.password)?;
        let mut user = User::new(
            &request.first_name,
            &request.last_name,
            &email,
            &request.phone_number,
            &request.city,
            &request.state_region,
            request.date_of_birth,
            password_hash,
        );
        user.created_at = Some(now);
        let user = self.users.create(user).await?;

        log::info!("[USER_REGISTERED] user={} email={}", user.id, user.email);

        // The account exists either way; the user can ask for a new link.
        if let Err(err) = self
            .send_token(&user, TokenKind::EmailVerification, now)
            .await
        {
            log::warn!(
                "Failed to send verification email to user {}: {}",
                user.id,
                err
            );
        }

        Ok(user.into())
    }

    pub async fn verify_email(&self, token: &str, now: DateTime<Utc>) -> AppResult<UserDto> {
        let token = self
            .redeem_token(token, TokenKind::EmailVerification, now)
            .await?;

        let mut user = self.get_user_entity(&token.user_id).await?;
        if !user.is_email_verified {
            user.is_email_verified = true;
            user = self.users.update(user).await?;
            log::info!("Email verified for user {}", user.id);
        }
        Ok(user.into())
    }

    /// Replaces any outstanding verification token for an unverified user.
    pub async fn resend_verification(&self, email: &str, now: DateTime<Utc>) -> AppResult<()> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No account for '{}'", email)))?;

        if user.is_email_verified {
            return Err(AppError::ValidationError(
                "Email address is already verified".to_string(),
            ));
        }

        self.send_token(&user, TokenKind::EmailVerification, now)
            .await
    }

    pub async fn login(&self, request: LoginRequest, now: DateTime<Utc>) -> AppResult<AuthResponse> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if let Some(remaining) = user.lockout_remaining(now) {
            return Err(AppError::AccountLocked { remaining });
        }

        if !verify_password(&request.password, &user.password_hash)? {
            user.record_failed_login(now);
            let user = self.users.update(user).await?;
            log::warn!(
                "Failed login for user {} ({} consecutive)",
                user.id,
                user.failed_login_attempts
            );
            return Err(invalid_credentials());
        }

        user.record_successful_login(now);
        let user = self.users.update(user).await?;
        let token = self.jwt.create_token(&user)?;

        log::info!("[USER_LOGIN] user={}", user.id);

        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Unknown addresses succeed silently so the endpoint can't be used to
    /// probe for accounts.
    pub async fn request_password_reset(&self, email: &str, now: DateTime<Utc>) -> AppResult<()> {
        let email = normalize_email(email);
        match self.users.find_by_email(&email).await? {
            Some(user) => self.send_token(&user, TokenKind::PasswordReset, now).await,
            None => {
                log::info!("Password reset requested for unknown email");
                Ok(())
            }
        }
    }

    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        request.validate()?;
        check_password_strength(&request.new_password)?;

        let token = self
            .redeem_token(&request.token, TokenKind::PasswordReset, now)
            .await?;

        let mut user = self.get_user_entity(&token.user_id).await?;
        user.password_hash = hash_password(&request.new_password)?;
        user.failed_login_attempts = 0;
        user.account_locked_until = None;
        self.users.update(user).await?;

        log::info!("Password reset for user {}", token.user_id);
        Ok(())
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<UserDto> {
        self.get_user_entity(user_id).await.map(UserDto::from)
    }

    async fn get_user_entity(&self, user_id: &str) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", user_id)))
    }

    async fn send_token(&self, user: &User, kind: TokenKind, now: DateTime<Utc>) -> AppResult<()> {
        self.tokens.delete_for_user(&user.id, kind).await?;

        let (token, plain) = AccountToken::issue(&user.id, kind, now);
        self.tokens.create(token).await?;

        let notification = match kind {
            TokenKind::EmailVerification => NotificationKind::EmailVerification,
            TokenKind::PasswordReset => NotificationKind::PasswordReset,
        };
        let context = HashMap::from([("token".to_string(), plain)]);
        self.notifier.notify(user, notification, context).await
    }

    /// Consumes a one-time token. Unknown, expired, used and wrong-kind tokens
    /// all fail the same way.
    async fn redeem_token(
        &self,
        plain: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> AppResult<AccountToken> {
        let invalid = || AppError::ValidationError("Invalid or expired token".to_string());

        let token = self
            .tokens
            .find_by_hash(&hash_token(plain))
            .await?
            .filter(|t| t.kind == kind && t.is_valid(now))
            .ok_or_else(invalid)?;

        if !self.tokens.mark_used(&token.id, now).await? {
            return Err(invalid());
        }
        Ok(token)
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::domain::user::{LOCKOUT_MINUTES, MAX_FAILED_LOGINS},
        repositories::{
            account_token_repository::MockAccountTokenRepository,
            user_repository::MockUserRepository,
        },
        services::notification::MockNotifier,
    };
    use chrono::{Duration, NaiveDate};
    use mockall::predicate::eq;

    const PASSWORD: &str = "Corr3ctHorse";

    fn service(
        users: MockUserRepository,
        tokens: MockAccountTokenRepository,
        notifier: MockNotifier,
    ) -> UserService {
        let jwt = JwtService::new(&Config::test_config().jwt_secret, 1);
        UserService::new(
            Arc::new(users),
            Arc::new(tokens),
            Arc::new(notifier),
            Arc::new(jwt),
        )
    }

    fn register_request(date_of_birth: NaiveDate, password: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "Jane.Doe@Example.com".to_string(),
            phone_number: "+12025551234".to_string(),
            city: "Springfield".to_string(),
            state_region: "IL".to_string(),
            date_of_birth,
            password: password.to_string(),
            password_confirm: password.to_string(),
        }
    }

    fn stored_user() -> User {
        let mut user = User::test_user("jane.doe@example.com");
        user.password_hash = hash_password(PASSWORD).unwrap();
        user
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            email: "jane.doe@example.com".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_creates_user_and_sends_verification() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .with(eq("jane.doe@example.com"))
            .returning(|_| Ok(None));
        users.expect_create().times(1).returning(Ok);

        let mut tokens = MockAccountTokenRepository::new();
        tokens
            .expect_delete_for_user()
            .withf(|_, kind| *kind == TokenKind::EmailVerification)
            .returning(|_, _| Ok(0));
        tokens.expect_create().times(1).returning(Ok);

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|user, kind, context| {
                user.email == "jane.doe@example.com"
                    && *kind == NotificationKind::EmailVerification
                    && context.contains_key("token")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let user = service(users, tokens, notifier)
            .register(register_request(dob, PASSWORD), Utc::now())
            .await
            .unwrap();

        assert_eq!(user.email, "jane.doe@example.com");
        assert!(!user.is_email_verified);
        assert!(!user.is_certified);
    }

    #[tokio::test]
    async fn register_rejects_minors() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();

        let now = Utc::now();
        let dob = now.date_naive() - Duration::days(365 * 17);
        let result = service(users, MockAccountTokenRepository::new(), MockNotifier::new())
            .register(register_request(dob, PASSWORD), now)
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let result = service(
            MockUserRepository::new(),
            MockAccountTokenRepository::new(),
            MockNotifier::new(),
        )
        .register(register_request(dob, "lowercase-only"), Utc::now())
        .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(User::test_user(email))));
        users.expect_create().never();

        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let result = service(users, MockAccountTokenRepository::new(), MockNotifier::new())
            .register(register_request(dob, PASSWORD), Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_unauthorized() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let result = service(users, MockAccountTokenRepository::new(), MockNotifier::new())
            .login(login_request(PASSWORD), Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn login_success_returns_valid_token() {
        let mut user = stored_user();
        user.failed_login_attempts = 3;
        let user_id = user.id.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_update()
            .withf(|u| u.failed_login_attempts == 0 && u.last_login.is_some())
            .times(1)
            .returning(Ok);

        let service = service(users, MockAccountTokenRepository::new(), MockNotifier::new());
        let response = service.login(login_request(PASSWORD), Utc::now()).await.unwrap();

        let claims = service.jwt.validate_token(&response.token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(response.user.id, user_id);
    }

    #[tokio::test]
    async fn fifth_wrong_password_locks_the_account() {
        let mut user = stored_user();
        user.failed_login_attempts = MAX_FAILED_LOGINS - 1;
        let now = Utc::now();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_update()
            .withf(move |u| {
                u.failed_login_attempts == MAX_FAILED_LOGINS
                    && u.account_locked_until == Some(now + Duration::minutes(LOCKOUT_MINUTES))
            })
            .times(1)
            .returning(Ok);

        let result = service(users, MockAccountTokenRepository::new(), MockNotifier::new())
            .login(login_request("Wrong-passw0rd"), now)
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn locked_account_rejects_even_the_right_password() {
        let now = Utc::now();
        let mut user = stored_user();
        user.failed_login_attempts = MAX_FAILED_LOGINS;
        user.account_locked_until = Some(now + Duration::minutes(10));

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_update().never();

        let result = service(users, MockAccountTokenRepository::new(), MockNotifier::new())
            .login(login_request(PASSWORD), now)
            .await;

        match result {
            Err(AppError::AccountLocked { remaining }) => {
                assert_eq!(remaining, Duration::minutes(10))
            }
            other => panic!("expected AccountLocked, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn expired_verification_token_is_rejected() {
        let issued = Utc::now() - Duration::hours(25);
        let (token, plain) = AccountToken::issue("user-1", TokenKind::EmailVerification, issued);

        let mut tokens = MockAccountTokenRepository::new();
        tokens
            .expect_find_by_hash()
            .with(eq(hash_token(&plain)))
            .returning(move |_| Ok(Some(token.clone())));
        tokens.expect_mark_used().never();

        let result = service(MockUserRepository::new(), tokens, MockNotifier::new())
            .verify_email(&plain, Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn reset_token_cannot_verify_email() {
        let now = Utc::now();
        let (token, plain) = AccountToken::issue("user-1", TokenKind::PasswordReset, now);

        let mut tokens = MockAccountTokenRepository::new();
        tokens
            .expect_find_by_hash()
            .returning(move |_| Ok(Some(token.clone())));
        tokens.expect_mark_used().never();

        let result = service(MockUserRepository::new(), tokens, MockNotifier::new())
            .verify_email(&plain, now)
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn verify_email_marks_user_verified() {
        let now = Utc::now();
        let user = stored_user();
        let (token, plain) = AccountToken::issue(&user.id, TokenKind::EmailVerification, now);

        let mut tokens = MockAccountTokenRepository::new();
        tokens
            .expect_find_by_hash()
            .returning(move |_| Ok(Some(token.clone())));
        tokens.expect_mark_used().times(1).returning(|_, _| Ok(true));

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_update()
            .withf(|u| u.is_email_verified)
            .times(1)
            .returning(Ok);

        let verified = service(users, tokens, MockNotifier::new())
            .verify_email(&plain, now)
            .await
            .unwrap();
        assert!(verified.is_email_verified);
    }

    #[tokio::test]
    async fn password_reset_for_unknown_email_is_silent() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut tokens = MockAccountTokenRepository::new();
        tokens.expect_create().never();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let result = service(users, tokens, notifier)
            .request_password_reset("nobody@example.com", Utc::now())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn reset_password_clears_lockout() {
        let now = Utc::now();
        let mut user = stored_user();
        user.failed_login_attempts = MAX_FAILED_LOGINS;
        user.account_locked_until = Some(now + Duration::minutes(20));
        let (token, plain) = AccountToken::issue(&user.id, TokenKind::PasswordReset, now);

        let mut tokens = MockAccountTokenRepository::new();
        tokens
            .expect_find_by_hash()
            .returning(move |_| Ok(Some(token.clone())));
        tokens.expect_mark_used().returning(|_, _| Ok(true));

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_update()
            .withf(|u| {
                u.failed_login_attempts == 0
                    && u.account_locked_until.is_none()
                    && verify_password("N3w-Passphrase", &u.password_hash).unwrap_or(false)
            })
            .times(1)
            .returning(Ok);

        let request = ResetPasswordRequest {
            token: plain,
            new_password: "N3w-Passphrase".to_string(),
            new_password_confirm: "N3w-Passphrase".to_string(),
        };
        service(users, tokens, MockNotifier::new())
            .reset_password(request, now)
            .await
            .unwrap();
    }
}
