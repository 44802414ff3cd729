//! Authentication service.
//!
//! Password login for both realms (customers and admin users), customer
//! registration and the failed-login lockout.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};

use cartwright_core::Email;

use crate::config::LockoutConfig;
use crate::db::{RepositoryError, Store};
use crate::models::{Credentials, Customer, CustomerData, LoginState, NewCustomer, User};
use crate::services::hooks;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A customer sign-up, as collected by the registration form.
#[derive(Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub accepted_terms: bool,
    pub subscribe_to_newsletter: bool,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Authentication service.
///
/// Handles registration, login and lockout for customers and admin users.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    lockout: LockoutConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, lockout: LockoutConfig) -> Self {
        Self { store, lockout }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Register a new customer with email and password.
    ///
    /// Registration counts as the first login, so `lastLogin` starts at now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_customer(&self, registration: Registration) -> Result<Customer, AuthError> {
        let email = Email::parse(&registration.email)?;
        validate_password(&registration.password)?;
        let password_hash = hash_password(&registration.password)?;

        let new = NewCustomer {
            data: CustomerData {
                email,
                first_name: registration.first_name.trim().to_owned(),
                last_name: registration.last_name.trim().to_owned(),
                phone: registration
                    .phone
                    .map(|p| p.trim().to_owned())
                    .filter(|p| !p.is_empty()),
                addresses: Vec::new(),
                wishlist: Vec::new(),
                accepted_terms: registration.accepted_terms,
                subscribe_to_newsletter: registration.subscribe_to_newsletter,
            },
            password_hash,
            last_login: Utc::now(),
        };

        let customer = self.store.insert_customer(new).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Log a customer in with email and password.
    ///
    /// On success the lockout counter is cleared and `lastLogin` is stamped;
    /// a failed stamp is logged and does not fail the login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::Locked` while the account is locked out.
    pub async fn login_customer(&self, email: &str, password: &str) -> Result<Customer, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let (mut customer, credentials) = self
            .store
            .find_customer_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        match self.check(&credentials, password, now)? {
            Check::Passed { reset } => {
                if reset {
                    self.store
                        .set_customer_login_state(customer.id, LoginState::default())
                        .await?;
                }
            }
            Check::Failed(state) => {
                self.store.set_customer_login_state(customer.id, state).await?;
                tracing::warn!(
                    customer_id = %customer.id,
                    attempts = state.attempts,
                    locked = state.lock_until.is_some(),
                    "Failed customer login"
                );
                return Err(AuthError::InvalidCredentials);
            }
        }

        if let Some(at) = hooks::update_last_login(self.store, customer.id, now).await {
            customer.last_login = Some(at);
        }
        Ok(customer)
    }

    // =========================================================================
    // Admin users
    // =========================================================================

    /// Create an admin user.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register_customer`].
    pub async fn create_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.store
            .insert_user(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Log an admin user in with email and password.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login_customer`].
    pub async fn login_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let (user, credentials) = self
            .store
            .find_user_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        match self.check(&credentials, password, Utc::now())? {
            Check::Passed { reset } => {
                if reset {
                    self.store
                        .set_user_login_state(user.id, LoginState::default())
                        .await?;
                }
                Ok(user)
            }
            Check::Failed(state) => {
                self.store.set_user_login_state(user.id, state).await?;
                tracing::warn!(
                    user_id = %user.id,
                    attempts = state.attempts,
                    locked = state.lock_until.is_some(),
                    "Failed admin login"
                );
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Verify a password against stored credentials, honoring the lockout.
    fn check(
        &self,
        credentials: &Credentials,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Check, AuthError> {
        if credentials.login.is_locked(now) {
            return Err(AuthError::Locked);
        }

        match verify_password(password, &credentials.password_hash) {
            Ok(()) => Ok(Check::Passed {
                reset: credentials.login != LoginState::default(),
            }),
            Err(AuthError::InvalidCredentials) => Ok(Check::Failed(
                credentials
                    .login
                    .after_failure(now, self.lockout.max_attempts, self.lockout.lock_time),
            )),
            Err(e) => Err(e),
        }
    }
}

/// Outcome of a password check on an unlocked account.
enum Check {
    /// Correct password; `reset` if stale counters should be cleared.
    Passed { reset: bool },
    /// Wrong password; the counters to persist.
    Failed(LoginState),
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::db::{CustomerStore, MemoryStore};

    fn registration() -> Registration {
        Registration {
            email: "Ada@Example.com".to_owned(),
            password: "analytical-engine".to_owned(),
            first_name: " Ada ".to_owned(),
            last_name: "Lovelace".to_owned(),
            phone: Some(String::new()),
            accepted_terms: true,
            subscribe_to_newsletter: false,
        }
    }

    fn service(store: &MemoryStore) -> AuthService<'_> {
        AuthService::new(store, LockoutConfig::default())
    }

    #[tokio::test]
    async fn test_register_normalizes_input() {
        let store = MemoryStore::new();
        let before = Utc::now();
        let customer = service(&store).register_customer(registration()).await.unwrap();

        assert_eq!(customer.data.email.as_str(), "ada@example.com");
        assert_eq!(customer.data.first_name, "Ada");
        assert_eq!(customer.data.phone, None);
        assert!(customer.last_login.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        service(&store).register_customer(registration()).await.unwrap();
        let err = service(&store)
            .register_customer(registration())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(store.list_customers(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let store = MemoryStore::new();
        let err = service(&store)
            .register_customer(Registration {
                password: "short".to_owned(),
                ..registration()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_login_stamps_last_login() {
        let store = MemoryStore::new();
        service(&store).register_customer(registration()).await.unwrap();

        let before = Utc::now();
        let customer = service(&store)
            .login_customer("ada@example.com", "analytical-engine")
            .await
            .unwrap();
        assert!(customer.last_login.unwrap() >= before);

        let stored = store.find_customer(customer.id).await.unwrap().unwrap();
        assert_eq!(stored.last_login, customer.last_login);
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_last_login() {
        let store = MemoryStore::new();
        let registered = service(&store).register_customer(registration()).await.unwrap();

        let err = service(&store)
            .login_customer("ada@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let stored = store.find_customer(registered.id).await.unwrap().unwrap();
        assert_eq!(stored.last_login, registered.last_login);
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let store = MemoryStore::new();
        let err = service(&store)
            .login_customer("nobody@example.com", "analytical-engine")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = service(&store)
            .login_customer("not an email", "analytical-engine")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_lockout_after_max_attempts() {
        let store = MemoryStore::new();
        let auth = AuthService::new(
            &store,
            LockoutConfig {
                max_attempts: 3,
                lock_time: TimeDelta::seconds(600),
            },
        );
        auth.register_customer(registration()).await.unwrap();

        for _ in 0..3 {
            let err = auth
                .login_customer("ada@example.com", "wrong-password")
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        // Even the right password is refused while locked
        let err = auth
            .login_customer("ada@example.com", "analytical-engine")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Locked));
    }

    #[tokio::test]
    async fn test_success_resets_attempts() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.register_customer(registration()).await.unwrap();

        auth.login_customer("ada@example.com", "wrong-password")
            .await
            .unwrap_err();
        auth.login_customer("ada@example.com", "analytical-engine")
            .await
            .unwrap();

        let email = Email::parse("ada@example.com").unwrap();
        let (_, credentials) = store.find_customer_credentials(&email).await.unwrap().unwrap();
        assert_eq!(credentials.login, LoginState::default());
    }

    #[tokio::test]
    async fn test_admin_login() {
        let store = MemoryStore::new();
        let auth = service(&store);
        let user = auth
            .create_user("admin@cartwright.dev", "correct-horse")
            .await
            .unwrap();

        let logged_in = auth
            .login_user("admin@cartwright.dev", "correct-horse")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        // Realms are separate: an admin cannot log in as a customer
        let err = auth
            .login_customer("admin@cartwright.dev", "correct-horse")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("analytical-engine").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("analytical-engine", &hash).is_ok());
        assert!(matches!(
            verify_password("nope", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
