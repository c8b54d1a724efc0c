//! Authentication API Endpoints
//! Registration, login, password change and identity lookup

use crate::auth::{
    models::{
        Identity, LoginRequest, LoginResponse, MessageResponse, NewAccount, RegisterRequest, Role,
        UpdatePasswordRequest,
    },
    password::{LegacyRehash, PasswordMatch},
    validation::{validate_email, validate_name, validate_new_password},
};
use crate::error::{run_blocking, ApiError, JsonBody};
use crate::AppState;
use anyhow::Context;
use axum::{extract::State, Extension, Json};
use tracing::{info, warn};

/// Account creation input shared by self-registration and admin creation
pub(crate) struct AccountInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub role: Role,
}

/// Validate, hash and insert an account; the plaintext never reaches storage or logs
pub(crate) async fn create_account(state: &AppState, input: AccountInput) -> Result<i64, ApiError> {
    validate_name(&input.name).map_err(ApiError::validation)?;
    validate_email(&input.email).map_err(ApiError::validation)?;
    if input.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let users = state.users.clone();
    let passwords = state.passwords.clone();
    run_blocking(move || -> Result<i64, ApiError> {
        let password_hash = passwords
            .hash(&input.password)
            .context("Failed to hash password")?;

        let id = users.insert(NewAccount {
            name: input.name.trim().to_string(),
            email: input.email,
            address: input.address.filter(|a| !a.trim().is_empty()),
            password_hash,
            role: input.role,
        })?;
        Ok(id)
    })
    .await
}

/// Parse an optional role string; blank means `user`
pub(crate) fn role_or_default(role: Option<&str>) -> Result<Role, ApiError> {
    match role.map(str::trim) {
        None | Some("") => Ok(Role::User),
        Some(r) => r
            .parse::<Role>()
            .map_err(|e| ApiError::validation(format!("Invalid role: {}", e.0))),
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("All fields required"));
    }
    let role = role_or_default(payload.role.as_deref())?;

    let id = create_account(
        &state,
        AccountInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            address: payload.address,
            role,
        },
    )
    .await?;

    info!(account_id = id, role = %role, "Registration successful");
    Ok(Json(MessageResponse {
        message: "Registration successful",
    }))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password required"));
    }

    let LoginRequest { email, password } = payload;
    let users = state.users.clone();
    let passwords = state.passwords.clone();
    let submitted = password.clone();

    let (credentials, outcome) = run_blocking(move || -> Result<_, ApiError> {
        let Some(credentials) = users.find_by_email(&email)? else {
            warn!(email = %email, "Failed login attempt: unknown email");
            return Err(ApiError::InvalidCredentials);
        };

        let outcome = passwords.verify(&submitted, &credentials.password);
        if outcome == PasswordMatch::Mismatch {
            warn!(email = %email, "Failed login attempt: wrong password");
            return Err(ApiError::InvalidCredentials);
        }
        Ok((credentials, outcome))
    })
    .await?;

    if outcome == PasswordMatch::Legacy {
        // Fire-and-forget: the response does not wait for, or depend on, the rewrite
        LegacyRehash {
            account_id: credentials.account.id,
            plaintext: password,
        }
        .spawn(state.users.clone(), state.passwords.clone());
    }

    let account = credentials.account;
    let token = state.jwt.issue(&Identity::from(&account))?;

    info!(account_id = account.id, role = %account.role, "Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
        role: account.role,
        email: account.email,
    }))
}

/// Update password - POST /api/auth/update-password (any signed-in role)
pub async fn update_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(payload): JsonBody<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::validation("Both passwords required"));
    }
    validate_new_password(&payload.new_password).map_err(ApiError::validation)?;

    let UpdatePasswordRequest {
        current_password,
        new_password,
    } = payload;
    let users = state.users.clone();
    let passwords = state.passwords.clone();
    let account_id = identity.id;

    run_blocking(move || -> Result<(), ApiError> {
        let credentials = users
            .find_credentials_by_id(account_id)?
            .ok_or(ApiError::NotFound("User not found"))?;

        if !passwords
            .verify(&current_password, &credentials.password)
            .is_match()
        {
            return Err(ApiError::validation("Current password incorrect"));
        }

        let new_hash = passwords
            .hash(&new_password)
            .context("Failed to hash password")?;

        if !users.update_password(account_id, &new_hash)? {
            return Err(ApiError::NotFound("User not found"));
        }
        Ok(())
    })
    .await?;

    info!(account_id = identity.id, "Password updated");
    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

/// Current identity - GET /api/auth/me
/// Built from the token claims, no database lookup
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}
