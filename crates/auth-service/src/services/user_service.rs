//! User registration, login and self-service account management.

use crate::crypto;
use crate::errors::AuthError;
use crate::models::{NewUser, RegisterRequest, UpdateUserRequest, User, UserProfile};
use crate::observability::hash_for_correlation;
use crate::repositories::UserRepository;
use common::secret::{ExposeSecret, SecretString};
use tracing::instrument;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_USERNAME_LENGTH: usize = 64;

/// Register a new user.
///
/// # Errors
///
/// - `InvalidInput` for an empty or overlong username, a malformed email, or
///   a password shorter than 8 characters
/// - `Conflict` if the username or email is taken
#[instrument(skip_all)]
pub async fn register_user(
    users: &dyn UserRepository,
    request: RegisterRequest,
    bcrypt_cost: u32,
) -> Result<UserProfile, AuthError> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&request.password)?;

    if users.find_by_username(&username).await?.is_some() {
        return Err(AuthError::Conflict("Username is already taken".to_string()));
    }
    if users.find_by_email(&email).await?.is_some() {
        return Err(AuthError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = crypto::hash_secret(request.password.expose_secret(), bcrypt_cost)?;
    let user = users
        .create(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(
        target: "auth.services.user",
        user = %hash_for_correlation(&user.username),
        "User registered"
    );

    Ok(UserProfile::from(&user))
}

/// Check a username/password pair.
///
/// Unknown users and wrong passwords fail identically with
/// `InvalidCredentials`, and both run one bcrypt verification.
#[instrument(skip_all)]
pub async fn authenticate(
    users: &dyn UserRepository,
    username: &str,
    password: &SecretString,
) -> Result<User, AuthError> {
    let user = users.find_by_username(username).await?;

    let hash_to_verify = match &user {
        Some(u) => u.password_hash.as_str(),
        None => crypto::DUMMY_BCRYPT_HASH,
    };
    let is_valid = crypto::verify_hash(password.expose_secret(), hash_to_verify)?;

    match user {
        Some(user) if is_valid => Ok(user),
        _ => {
            tracing::debug!(
                target: "auth.services.user",
                user = %hash_for_correlation(username),
                "Login rejected"
            );
            Err(AuthError::InvalidCredentials)
        }
    }
}

pub async fn get_user(users: &dyn UserRepository, username: &str) -> Result<User, AuthError> {
    users
        .find_by_username(username)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
}

/// Update email and/or password. An absent or empty password keeps the
/// current hash.
#[instrument(skip_all)]
pub async fn update_user(
    users: &dyn UserRepository,
    username: &str,
    request: UpdateUserRequest,
    bcrypt_cost: u32,
) -> Result<UserProfile, AuthError> {
    let mut user = get_user(users, username).await?;

    if let Some(email) = request.email {
        let email = email.trim().to_string();
        validate_email(&email)?;
        if email != user.email && users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict("Email is already registered".to_string()));
        }
        user.email = email;
    }

    if let Some(password) = request.password.filter(|p| !p.expose_secret().is_empty()) {
        validate_password(&password)?;
        user.password_hash = crypto::hash_secret(password.expose_secret(), bcrypt_cost)?;
    }

    let updated = users.update(&user).await?;
    tracing::info!(
        target: "auth.services.user",
        user = %hash_for_correlation(&updated.username),
        "User updated"
    );

    Ok(UserProfile::from(&updated))
}

#[instrument(skip_all)]
pub async fn delete_user(users: &dyn UserRepository, username: &str) -> Result<(), AuthError> {
    if !users.delete(username).await? {
        return Err(AuthError::NotFound("User not found".to_string()));
    }

    tracing::info!(
        target: "auth.services.user",
        user = %hash_for_correlation(username),
        "User deleted"
    );
    Ok(())
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::InvalidInput("Username is required".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    // Shape check only; deliverability is not verified.
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(AuthError::InvalidInput("Invalid email format".to_string()));
    }
    Ok(())
}

fn validate_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_BCRYPT_COST;
    use crate::repositories::memory::InMemoryUserRepository;

    fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: SecretString::from(password.to_string()),
        }
    }

    async fn repo_with_john() -> InMemoryUserRepository {
        let repo = InMemoryUserRepository::new();
        register_user(
            &repo,
            register_request("john_doe", "john@example.com", "password123"),
            MIN_BCRYPT_COST,
        )
        .await
        .expect("register");
        repo
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let repo = repo_with_john().await;

        let user = authenticate(&repo, "john_doe", &SecretString::from("password123"))
            .await
            .expect("login");
        assert_eq!(user.email, "john@example.com");
        assert_ne!(user.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_generic() {
        let repo = repo_with_john().await;

        let wrong_password =
            authenticate(&repo, "john_doe", &SecretString::from("wrong-password")).await;
        let unknown_user =
            authenticate(&repo, "nobody", &SecretString::from("password123")).await;

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_register_duplicates_conflict() {
        let repo = repo_with_john().await;

        let same_name = register_user(
            &repo,
            register_request("john_doe", "other@example.com", "password123"),
            MIN_BCRYPT_COST,
        )
        .await;
        let same_email = register_user(
            &repo,
            register_request("johnny", "john@example.com", "password123"),
            MIN_BCRYPT_COST,
        )
        .await;

        assert!(matches!(same_name, Err(AuthError::Conflict(_))));
        assert!(matches!(same_email, Err(AuthError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let repo = InMemoryUserRepository::new();

        for (username, email, password) in [
            ("", "a@example.com", "password123"),
            ("alice", "not-an-email", "password123"),
            ("alice", "alice@example.com", "short"),
        ] {
            let result = register_user(
                &repo,
                register_request(username, email, password),
                MIN_BCRYPT_COST,
            )
            .await;
            assert!(
                matches!(result, Err(AuthError::InvalidInput(_))),
                "{username}/{email} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_update_user_email_and_password() {
        let repo = repo_with_john().await;

        let profile = update_user(
            &repo,
            "john_doe",
            UpdateUserRequest {
                email: Some("john.doe@example.com".to_string()),
                password: Some(SecretString::from("new-password-456")),
            },
            MIN_BCRYPT_COST,
        )
        .await
        .expect("update");

        assert_eq!(profile.email, "john.doe@example.com");
        assert!(
            authenticate(&repo, "john_doe", &SecretString::from("new-password-456"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_update_user_empty_password_keeps_old() {
        let repo = repo_with_john().await;

        update_user(
            &repo,
            "john_doe",
            UpdateUserRequest {
                email: None,
                password: Some(SecretString::from("")),
            },
            MIN_BCRYPT_COST,
        )
        .await
        .expect("update");

        assert!(
            authenticate(&repo, "john_doe", &SecretString::from("password123"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = repo_with_john().await;

        delete_user(&repo, "john_doe").await.expect("delete");
        assert!(matches!(
            delete_user(&repo, "john_doe").await,
            Err(AuthError::NotFound(_))
        ));
        assert!(matches!(
            get_user(&repo, "john_doe").await,
            Err(AuthError::NotFound(_))
        ));
    }
}
