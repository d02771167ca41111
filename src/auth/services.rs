use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking},
        repo::{NewUser, User, UserStore},
    },
    error::AppError,
};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}$").unwrap();
    // Verified against when the email is unknown so both paths cost one Argon2 run.
    static ref DUMMY_HASH: String = hash_password("dummy-password-for-timing").unwrap_or_default();
}

/// Builds the dummy hash on the blocking pool so no request pays for it.
pub async fn prepare_dummy_hash() -> anyhow::Result<()> {
    tokio::task::spawn_blocking(|| lazy_static::initialize(&DUMMY_HASH)).await?;
    Ok(())
}

async fn verify_against_dummy(password: String) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || verify_password(&password, &DUMMY_HASH)).await?;
    Ok(())
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

pub async fn register(users: &dyn UserStore, req: RegisterRequest) -> Result<User, AppError> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(AppError::BadRequest("Email and password are required".into()));
    };
    let name = present(req.name).map(|n| n.trim().to_string());

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email format".into()));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password_blocking(password).await?;

    let user = users
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Returns a signed token for valid credentials. Unknown email and wrong
/// password fail identically.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<String, AppError> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(AppError::BadRequest("Email and password are required".into()));
    };
    let email = normalize_email(&email);

    let Some(user) = users.find_by_email(&email).await? else {
        verify_against_dummy(password).await?;
        warn!(email = %email, "login unknown email");
        return Err(AppError::invalid_credentials());
    };

    let ok = verify_password_blocking(password, user.password_hash.clone()).await?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::invalid_credentials());
    }

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(token)
}
