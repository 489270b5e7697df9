use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LandingView, LoginRequest, PublicUser, RegisterRequest, SessionResponse},
    jwt::JwtKeys,
    repo::ProfileRepo,
    repo_types::{NewUser, Profile, Role, UserRecord},
};
use crate::error::{AppError, AppResult, StoreError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Profile built from sign-up metadata when the provisioning trigger did not
/// create one: name falls back to the email local-part, role to student.
pub fn provisional_profile(user: &UserRecord) -> Profile {
    let full_name = user
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| user.email.split('@').next().filter(|p| !p.is_empty()))
        .unwrap_or("User")
        .to_string();
    Profile {
        id: user.id,
        email: user.email.clone(),
        full_name,
        role: user.role.unwrap_or(Role::Student),
        avatar_url: None,
    }
}

fn issue_tokens(keys: &JwtKeys, user: &UserRecord, role: Role) -> AppResult<AuthResponse> {
    let access_token = keys.sign_access(user.id, role).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        AppError::Unexpected(e)
    })?;
    let refresh_token = keys.sign_refresh(user.id, role).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        AppError::Unexpected(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email.clone(),
            role,
        },
    })
}

/// Effective role: the profile wins, then sign-up metadata, then student.
async fn effective_role<S: ProfileRepo + ?Sized>(store: &S, user: &UserRecord) -> AppResult<Role> {
    let profile = store.find_profile(user.id).await?;
    Ok(profile
        .map(|p| p.role)
        .or(user.role)
        .unwrap_or(Role::Student))
}

pub async fn register<S: ProfileRepo + ?Sized>(
    store: &S,
    keys: &JwtKeys,
    mut payload: RegisterRequest,
) -> AppResult<AuthResponse> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::validation("Password too short"));
    }
    if store.find_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = store
        .create_user(&NewUser {
            email: payload.email,
            password_hash,
            full_name: payload.full_name.filter(|n| !n.trim().is_empty()),
            role: payload.role,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => AppError::Conflict("Email already registered".into()),
            other => other.into(),
        })?;

    let role = effective_role(store, &user).await?;
    info!(user_id = %user.id, email = %user.email, %role, "user registered");
    issue_tokens(keys, &user, role)
}

pub async fn login<S: ProfileRepo + ?Sized>(
    store: &S,
    keys: &JwtKeys,
    mut payload: LoginRequest,
) -> AppResult<AuthResponse> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    let Some(user) = store.find_user_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let role = effective_role(store, &user).await?;
    info!(user_id = %user.id, email = %user.email, %role, "user logged in");
    issue_tokens(keys, &user, role)
}

pub async fn refresh<S: ProfileRepo + ?Sized>(
    store: &S,
    keys: &JwtKeys,
    refresh_token: &str,
) -> AppResult<AuthResponse> {
    let claims = keys
        .verify_refresh(refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;
    let user = store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    let role = effective_role(store, &user).await?;
    issue_tokens(keys, &user, role)
}

/// Loads the caller's profile, creating it once from sign-up metadata when it
/// is missing. Anything other than a connectivity failure ends the session.
pub async fn bootstrap_session<S: ProfileRepo + ?Sized>(
    store: &S,
    user_id: Uuid,
) -> AppResult<SessionResponse> {
    let (profile, repaired) = match store.find_profile(user_id).await {
        Ok(Some(profile)) => (profile, false),
        Ok(None) => (repair_profile(store, user_id).await?, true),
        Err(StoreError::Unavailable(msg)) => return Err(StoreError::Unavailable(msg).into()),
        Err(e) => {
            error!(error = %e, %user_id, "critical profile fetch error");
            return Err(AppError::SessionTerminated(
                "Could not load your profile. You have been signed out.".into(),
            ));
        }
    };

    let landing_view = LandingView::for_role(profile.role);
    info!(%user_id, role = %profile.role, ?landing_view, repaired, "session bootstrapped");
    Ok(SessionResponse {
        profile,
        landing_view,
        repaired,
    })
}

async fn repair_profile<S: ProfileRepo + ?Sized>(store: &S, user_id: Uuid) -> AppResult<Profile> {
    warn!(%user_id, "profile not found; attempting manual creation");
    let user = match store.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err(AppError::SessionTerminated(
                "Account no longer exists. You have been signed out.".into(),
            ))
        }
        Err(StoreError::Unavailable(msg)) => return Err(StoreError::Unavailable(msg).into()),
        Err(e) => {
            error!(error = %e, %user_id, "user lookup during profile repair failed");
            return Err(AppError::SessionTerminated(
                "Profile setup incomplete. You have been signed out.".into(),
            ));
        }
    };

    match store.insert_profile(&provisional_profile(&user)).await {
        Ok(profile) => Ok(profile),
        Err(StoreError::Unavailable(msg)) => Err(StoreError::Unavailable(msg).into()),
        Err(e) => {
            error!(error = %e, %user_id, "failed to create profile manually");
            Err(AppError::SessionTerminated(
                "Profile setup incomplete. You have been signed out.".into(),
            ))
        }
    }
}
