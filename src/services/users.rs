//! Identity service: registration, authentication and customer management

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{RegisterUser, Role, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account. Admin accounts require the shared
    /// provisioning secret from configuration.
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        if request.role == Role::Admin {
            let presented = request.admin_secret.as_deref().unwrap_or_default();
            if presented != self.config.admin_secret {
                return Err(AppError::AdminSecretInvalid);
            }
        }

        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hash_password(&request.password)?;
        let role = request.role;

        self.repository.users.create(&request, &password_hash, role).await
    }

    /// Authenticate by email and password, returning a bearer token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;

        Ok((token, user))
    }

    /// Create a JWT token for a user with the fixed configured lifetime
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.token_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify a password against the stored argon2 hash
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// List all customer accounts
    pub async fn list_customers(&self) -> AppResult<Vec<User>> {
        self.repository.users.list_all().await
    }

    /// Delete a customer account
    pub async fn delete_customer(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await
    }
}
