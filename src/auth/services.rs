use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::Role,
        dto::{LoginRequest, LoginResponse, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_dummy, verify_password},
        repo::UserStore,
        repo_types::NewUser,
    },
    config::AdminSeed,
    error::{AppError, StoreError},
};

const MIN_USERNAME_LEN: usize = 3;
const MIN_SECRET_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a `user`-role account and returns its id. Input is validated before the
/// store is touched.
pub async fn register(users: &dyn UserStore, req: RegisterRequest) -> Result<Uuid, AppError> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput("invalid email".into()));
    }
    if req.secret.chars().count() < MIN_SECRET_LEN {
        return Err(AppError::InvalidInput(format!(
            "secret must be at least {MIN_SECRET_LEN} characters"
        )));
    }

    let password_hash = hash_password(&req.secret).map_err(AppError::Internal)?;
    let user = users
        .create(NewUser {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(user_id = %user.id, "user registered");
    Ok(user.id)
}

/// Checks credentials and issues a token. Unknown email and wrong secret produce the
/// same error.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<LoginResponse, AppError> {
    let email = normalize_email(&req.email);

    let Some(user) = users.find_by_email(&email).await? else {
        verify_dummy(&req.secret);
        warn!("login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let ok = verify_password(&req.secret, &user.password_hash).map_err(AppError::Internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid secret");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(user.id, user.role).map_err(AppError::Internal)?;
    info!(user_id = %user.id, role = ?user.role, "user logged in");
    Ok(LoginResponse {
        token,
        role: user.role,
        username: user.username,
    })
}

/// Creates the configured admin account unless its email is already registered.
/// An existing `user` account with that email is left as it is.
pub async fn ensure_admin(users: &dyn UserStore, seed: &AdminSeed) -> Result<(), AppError> {
    let email = normalize_email(&seed.email);
    if let Some(existing) = users.find_by_email(&email).await? {
        match existing.role {
            Role::Admin => debug!(user_id = %existing.id, "admin account already present"),
            Role::User => warn!(
                user_id = %existing.id,
                "admin seed email belongs to a non-admin account, no admin provisioned"
            ),
        }
        return Ok(());
    }

    let password_hash = hash_password(&seed.secret).map_err(AppError::Internal)?;
    let new_user = NewUser {
        id: Uuid::new_v4(),
        username: seed.username.trim().to_string(),
        email,
        password_hash,
        role: Role::Admin,
    };
    match users.create(new_user).await {
        Ok(user) => info!(user_id = %user.id, "admin account provisioned"),
        Err(StoreError::Duplicate) => warn!(
            username = %seed.username.trim(),
            "admin seed username is taken, no admin provisioned"
        ),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
