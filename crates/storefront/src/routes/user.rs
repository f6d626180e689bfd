//! Account route handlers.
//!
//! Signup and password login. A successful login stores the user's identity
//! in the session; the cart routes read it back through `RequireAuth`.
//!
//! Logged-in users also manage their own profile, password, and saved
//! addresses here.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{AddressId, UserId};

use super::AppJson;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    OptionalAuth, RequireAuth, clear_current_user, refresh_current_user, set_current_user,
};
use crate::models::{Address, AddressInput, PublicProfile, User};
use crate::state::AppState;

/// Body of `POST /user/signup`.
#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /user/login`.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `PUT /user/update-user-info`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Current password, required to confirm the change.
    pub password: String,
}

impl std::fmt::Debug for UpdateProfileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateProfileRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `PUT /user/update-user-password`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for UpdatePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatePasswordRequest").finish_non_exhaustive()
    }
}

/// Plain `{success, message}` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `{success, user}` response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

/// `{success, addresses}` response.
#[derive(Debug, Serialize)]
pub struct AddressesResponse {
    pub success: bool,
    pub addresses: Vec<Address>,
}

/// `{success, user}` response for another user's public profile.
#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub success: bool,
    pub user: PublicProfile,
}

/// Create an account.
#[instrument(skip(state))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(body): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    state
        .auth()
        .register_with_password(&body.name, &body.email, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: "User created successfully. You can now log in with your email and password.",
        }),
    ))
}

/// Log in with email and password.
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .auth()
        .login_with_password(&body.email, &body.password)
        .await?;

    set_current_user(&session, &user.to_current_user()).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Log out. Succeeds whether or not anyone was logged in.
#[instrument(skip(session, user))]
pub async fn logout(session: Session, OptionalAuth(user): OptionalAuth) -> Result<Json<MessageResponse>> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User logged out");
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "Logged out successfully",
    }))
}

/// The logged-in user's account.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserResponse>> {
    let user = state.auth().get_user(user.id).await?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Update the logged-in user's name, email, and phone number.
#[instrument(skip(state, session, user, body), fields(user_id = %user.id))]
pub async fn update_info(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .auth()
        .update_profile(
            user.id,
            &body.name,
            &body.email,
            body.phone_number.as_deref(),
            &body.password,
        )
        .await?;

    refresh_current_user(&session, &user.to_current_user()).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Change the logged-in user's password.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    AppJson(body): AppJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .auth()
        .change_password(
            user.id,
            &body.old_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Password updated successfully",
    }))
}

/// The logged-in user's saved addresses.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<AddressesResponse>> {
    let addresses = state.auth().addresses(user.id).await?;

    Ok(Json(AddressesResponse {
        success: true,
        addresses,
    }))
}

/// Add an address, or replace the one named by `id`.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update_addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    AppJson(body): AppJson<AddressInput>,
) -> Result<Json<AddressesResponse>> {
    let addresses = state.auth().save_address(user.id, &body).await?;

    Ok(Json(AddressesResponse {
        success: true,
        addresses,
    }))
}

/// Delete one of the logged-in user's addresses.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(address_id): Path<AddressId>,
) -> Result<Json<AddressesResponse>> {
    let addresses = state.auth().delete_address(user.id, address_id).await?;

    Ok(Json(AddressesResponse {
        success: true,
        addresses,
    }))
}

/// Any user's public profile. No login required.
#[instrument(skip(state))]
pub async fn user_info(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<PublicProfileResponse>> {
    let user = state.auth().public_profile(user_id).await?;

    Ok(Json(PublicProfileResponse {
        success: true,
        user,
    }))
}
