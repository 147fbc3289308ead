//! Authentication and user management service

use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        normalize_email, normalize_username, ChangePassword, NewUser, RegisterRequest,
        TokenResponse, UpdateProfile, User, UserResponse, PASSWORD_MIN_LEN,
    },
    repository::Repository,
    services::tokens::TokenService,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl UsersService {
    pub fn new(repository: Repository, tokens: TokenService, config: &AuthConfig) -> Self {
        Self {
            repository,
            tokens,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                PASSWORD_MIN_LEN
            )));
        }
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }

    /// Verify a password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> bool {
        match bcrypt::verify(password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("Error verifying password for user {}: {}", user.id, e);
                false
            }
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        self.repository.users.get_by_id(id).await
    }

    /// Case-insensitive lookup by username
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.repository
            .users
            .get_by_username(&username.trim().to_lowercase())
            .await
    }

    /// Case-insensitive lookup by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.repository
            .users
            .get_by_email(&email.trim().to_lowercase())
            .await
    }

    /// Create a new user with a hashed password
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: Option<String>,
        is_admin: bool,
    ) -> AppResult<User> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;

        if self.repository.users.get_by_username(&username).await?.is_some() {
            return Err(AppError::Validation(format!(
                "Username '{}' already exists",
                username
            )));
        }
        if self.repository.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::Validation(format!("Email '{}' already exists", email)));
        }

        let password_hash = self.hash_password(password)?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                username,
                email,
                password_hash,
                full_name,
                is_admin,
            })
            .await?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Register an account and sign it in.
    ///
    /// The first account of a fresh install becomes the administrator.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<TokenResponse> {
        let is_admin = self.repository.users.count().await? == 0;
        let user = self
            .create_user(
                &request.username,
                &request.email,
                &request.password,
                request.full_name,
                is_admin,
            )
            .await?;
        if is_admin {
            tracing::info!("First account {} granted administrator rights", user.username);
        }
        self.sign_in(user).await
    }

    /// Check credentials; `login` may be a username or an email
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<User> {
        let user = match self.get_by_username(login).await? {
            Some(user) => Some(user),
            None => self.get_by_email(login).await?,
        };

        let user = user
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password) {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        if !user.is_active {
            return Err(AppError::Authentication("User account is inactive".to_string()));
        }

        Ok(user)
    }

    /// Authenticate and issue a token
    pub async fn login(&self, login: &str, password: &str) -> AppResult<TokenResponse> {
        let user = self.authenticate(login, password).await?;
        self.sign_in(user).await
    }

    async fn sign_in(&self, user: User) -> AppResult<TokenResponse> {
        let access_token = self
            .tokens
            .create_access_token(&user.id.to_string(), &user.username)?;
        let user = self.update_last_login(user.id).await?;

        tracing::info!("User {} signed in", user.username);
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: UserResponse::from(user),
        })
    }

    pub async fn update_last_login(&self, user_id: Uuid) -> AppResult<User> {
        self.repository.users.update_last_login(user_id).await
    }

    /// Update own profile (email, full name)
    pub async fn update_profile(&self, user: &User, profile: UpdateProfile) -> AppResult<User> {
        let email = match profile.email.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(raw) => {
                let email = normalize_email(raw)?;
                if let Some(existing) = self.repository.users.get_by_email(&email).await? {
                    if existing.id != user.id {
                        return Err(AppError::Validation("Email already in use".to_string()));
                    }
                }
                Some(email)
            }
            None => None,
        };

        self.repository
            .users
            .update_profile(user.id, email, profile.full_name)
            .await
    }

    /// Change own password after checking the current one
    pub async fn change_password(&self, user: &User, request: ChangePassword) -> AppResult<User> {
        if !self.verify_password(user, &request.current_password) {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }
        self.update_password(user.id, &request.new_password).await
    }

    pub async fn update_password(&self, user_id: Uuid, new_password: &str) -> AppResult<User> {
        let hash = self.hash_password(new_password)?;
        self.repository.users.update_password(user_id, &hash).await
    }

    pub async fn activate(&self, user_id: Uuid) -> AppResult<User> {
        self.set_active(user_id, true).await
    }

    pub async fn deactivate(&self, user_id: Uuid) -> AppResult<User> {
        self.set_active(user_id, false).await
    }

    async fn set_active(&self, user_id: Uuid, active: bool) -> AppResult<User> {
        if self.repository.users.get_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        let user = self.repository.users.set_active(user_id, active).await?;
        tracing::info!("User {} is_active set to {}", user.username, active);
        Ok(user)
    }

    /// True once at least one account exists; storage errors count as false
    pub async fn multiuser_enabled(&self) -> bool {
        match self.repository.users.count().await {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!("Could not count users: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::{
        health::MockHealthStore, notebooks::MockNotebooksStore, sources::MockSourcesStore,
        users::MockUsersStore,
    };

    pub(crate) const TEST_BCRYPT_COST: u32 = 4;

    pub(crate) fn test_auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            bcrypt_cost: TEST_BCRYPT_COST,
            ..AuthConfig::default()
        }
    }

    pub(crate) fn sample_user(username: &str, password: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: bcrypt::hash(password, TEST_BCRYPT_COST).unwrap(),
            full_name: None,
            is_active: true,
            is_admin: false,
            last_login: None,
            created: now,
            updated: now,
        }
    }

    fn service(users: MockUsersStore) -> UsersService {
        let config = test_auth_config();
        let repository = Repository::from_stores(
            Arc::new(users),
            Arc::new(MockNotebooksStore::new()),
            Arc::new(MockSourcesStore::new()),
            Arc::new(MockHealthStore::new()),
        );
        UsersService::new(repository, TokenService::new(&config), &config)
    }

    fn stored_from(new: &NewUser) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            full_name: new.full_name.clone(),
            is_active: true,
            is_admin: new.is_admin,
            last_login: None,
            created: now,
            updated: now,
        }
    }

    #[tokio::test]
    async fn create_user_hashes_and_normalizes() {
        let mut store = MockUsersStore::new();
        store
            .expect_get_by_username()
            .with(eq("testuser"))
            .returning(|_| Ok(None));
        store
            .expect_get_by_email()
            .with(eq("test@example.com"))
            .returning(|_| Ok(None));
        store
            .expect_create()
            .times(1)
            .returning(|new| Ok(stored_from(new)));

        let users = service(store);
        let user = users
            .create_user(
                "TestUser",
                "Test@Example.com",
                "testpassword123",
                Some("Test User".to_string()),
                false,
            )
            .await
            .unwrap();

        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.full_name.as_deref(), Some("Test User"));
        assert!(user.is_active);
        assert!(!user.is_admin);
        assert_ne!(user.password_hash, "testpassword123");
        assert!(users.verify_password(&user, "testpassword123"));
        assert!(!users.verify_password(&user, "wrongpassword"));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let existing = sample_user("duplicate", "testpassword123");
        let mut store = MockUsersStore::new();
        store
            .expect_get_by_username()
            .returning(move |_| Ok(Some(existing.clone())));
        store.expect_create().never();

        let err = service(store)
            .create_user("duplicate", "user2@example.com", "testpassword123", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("already exists")));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let existing = sample_user("user1", "testpassword123");
        let mut store = MockUsersStore::new();
        store.expect_get_by_username().returning(|_| Ok(None));
        store
            .expect_get_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        store.expect_create().never();

        let err = service(store)
            .create_user("user2", "user1@example.com", "testpassword123", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("Email")));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let mut store = MockUsersStore::new();
        store.expect_get_by_username().returning(|_| Ok(None));
        store.expect_get_by_email().returning(|_| Ok(None));
        store.expect_create().never();

        let err = service(store)
            .create_user("shorty", "shorty@example.com", "12345", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn lookups_are_case_insensitive() {
        let mut store = MockUsersStore::new();
        store
            .expect_get_by_username()
            .with(eq("testuser3"))
            .returning(|_| Ok(Some(sample_user("testuser3", "testpassword123"))));
        store
            .expect_get_by_email()
            .with(eq("test4@example.com"))
            .returning(|_| Ok(None));

        let users = service(store);
        let user = users.get_by_username("TESTUSER3").await.unwrap().unwrap();
        assert_eq!(user.username, "testuser3");
        assert!(users.get_by_email("TEST4@EXAMPLE.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_falls_back_to_email_and_records_login() {
        let user = sample_user("alice", "testpassword123");
        let user_id = user.id;
        let lookup = user.clone();

        let mut store = MockUsersStore::new();
        store.expect_get_by_username().returning(|_| Ok(None));
        store
            .expect_get_by_email()
            .with(eq("alice@example.com"))
            .returning(move |_| Ok(Some(lookup.clone())));
        store
            .expect_update_last_login()
            .with(eq(user_id))
            .times(1)
            .returning(move |_| {
                let mut updated = user.clone();
                updated.last_login = Some(Utc::now());
                Ok(updated)
            });

        let users = service(store);
        let response = users.login("alice@example.com", "testpassword123").await.unwrap();
        assert_eq!(response.token_type, "bearer");
        assert!(response.user.last_login.is_some());
        assert_eq!(
            users.tokens.user_id_from_token(&response.access_token),
            Some(user_id.to_string())
        );
    }

    #[tokio::test]
    async fn login_rejects_bad_password_and_inactive_account() {
        let mut inactive = sample_user("bob", "testpassword123");
        inactive.is_active = false;

        let mut store = MockUsersStore::new();
        store
            .expect_get_by_username()
            .returning(move |_| Ok(Some(inactive.clone())));
        store.expect_update_last_login().never();

        let users = service(store);
        let err = users.login("bob", "nope-nope").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(msg) if msg == "Invalid username or password"));

        let err = users.login("bob", "testpassword123").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(msg) if msg == "User account is inactive"));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let user = sample_user("testuser5", "oldpassword");
        let target = user.id;

        let mut store = MockUsersStore::new();
        store
            .expect_update_password()
            .withf(move |id, _| *id == target)
            .times(1)
            .returning({
                let user = user.clone();
                move |_, hash| {
                    let mut updated = user.clone();
                    updated.password_hash = hash.to_string();
                    Ok(updated)
                }
            });

        let users = service(store);
        let err = users
            .change_password(
                &user,
                ChangePassword {
                    current_password: "wrong".to_string(),
                    new_password: "newpassword123".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Current password is incorrect"));

        let updated = users
            .change_password(
                &user,
                ChangePassword {
                    current_password: "oldpassword".to_string(),
                    new_password: "newpassword123".to_string(),
                },
            )
            .await
            .unwrap();
        assert_ne!(updated.password_hash, user.password_hash);
        assert!(!users.verify_password(&updated, "oldpassword"));
        assert!(users.verify_password(&updated, "newpassword123"));
    }

    #[tokio::test]
    async fn update_profile_rejects_email_of_other_user() {
        let me = sample_user("me", "testpassword123");
        let other = sample_user("other", "testpassword123");

        let mut store = MockUsersStore::new();
        store
            .expect_get_by_email()
            .returning(move |_| Ok(Some(other.clone())));
        store.expect_update_profile().never();

        let err = service(store)
            .update_profile(
                &me,
                UpdateProfile {
                    email: Some("other@example.com".to_string()),
                    full_name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Email already in use"));
    }

    #[tokio::test]
    async fn update_profile_keeps_own_email() {
        let me = sample_user("me", "testpassword123");
        let me_lookup = me.clone();
        let me_id = me.id;

        let mut store = MockUsersStore::new();
        store
            .expect_get_by_email()
            .returning(move |_| Ok(Some(me_lookup.clone())));
        store
            .expect_update_profile()
            .withf(move |id, email, name| {
                *id == me_id
                    && email.as_deref() == Some("me@example.com")
                    && name.as_deref() == Some("Me Myself")
            })
            .times(1)
            .returning({
                let me = me.clone();
                move |_, _, name| {
                    let mut updated = me.clone();
                    updated.full_name = name;
                    Ok(updated)
                }
            });

        let updated = service(store)
            .update_profile(
                &me,
                UpdateProfile {
                    email: Some("ME@example.com".to_string()),
                    full_name: Some("Me Myself".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Me Myself"));
    }

    #[tokio::test]
    async fn deactivate_and_activate() {
        let user = sample_user("testuser6", "testpassword123");
        let id = user.id;

        let mut store = MockUsersStore::new();
        store.expect_get_by_id().returning({
            let user = user.clone();
            move |_| Ok(Some(user.clone()))
        });
        store
            .expect_set_active()
            .with(eq(id), eq(false))
            .times(1)
            .returning({
                let user = user.clone();
                move |_, active| Ok(User { is_active: active, ..user.clone() })
            });
        store
            .expect_set_active()
            .with(eq(id), eq(true))
            .times(1)
            .returning(move |_, active| Ok(User { is_active: active, ..user.clone() }));

        let users = service(store);
        assert!(!users.deactivate(id).await.unwrap().is_active);
        assert!(users.activate(id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn activate_unknown_user_is_not_found() {
        let mut store = MockUsersStore::new();
        store.expect_get_by_id().returning(|_| Ok(None));
        store.expect_set_active().never();

        let err = service(store).activate(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn multiuser_enabled_tracks_user_count() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let mut store = MockUsersStore::new();
        store.expect_count().times(3).returning(move || {
            match calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) {
                0 => Ok(0),
                1 => Ok(2),
                _ => Err(AppError::Internal("db down".to_string())),
            }
        });

        let users = service(store);
        assert!(!users.multiuser_enabled().await);
        assert!(users.multiuser_enabled().await);
        assert!(!users.multiuser_enabled().await);
    }

    fn registration(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "testpassword123".to_string(),
            full_name: None,
        }
    }

    fn store_for_registration(existing_accounts: i64, expect_admin: bool) -> MockUsersStore {
        let mut store = MockUsersStore::new();
        store.expect_count().returning(move || Ok(existing_accounts));
        store.expect_get_by_username().returning(|_| Ok(None));
        store.expect_get_by_email().returning(|_| Ok(None));
        store
            .expect_create()
            .withf(move |new| new.is_admin == expect_admin)
            .times(1)
            .returning(|new| Ok(stored_from(new)));
        store.expect_update_last_login().returning(move |id| {
            let mut user = sample_user("signed-in", "testpassword123");
            user.id = id;
            user.is_admin = expect_admin;
            Ok(user)
        });
        store
    }

    #[tokio::test]
    async fn first_registration_becomes_admin() {
        let store = store_for_registration(0, true);
        let response = service(store).register(registration("founder")).await.unwrap();
        assert!(response.user.is_admin);
    }

    #[tokio::test]
    async fn later_registrations_are_not_admin() {
        let store = store_for_registration(1, false);
        let response = service(store).register(registration("second")).await.unwrap();
        assert!(!response.user.is_admin);
    }
}
