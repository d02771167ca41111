use axum::{
    extract::{
        multipart::MultipartRejection, DefaultBodyLimit, FromRequest, Multipart, Request, State,
    },
    http::{
        header::{CONTENT_TYPE, HOST},
        HeaderMap,
    },
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    auth::{dto::PublicUser, middleware::require_auth, repo::User, AuthUser},
    config::AppConfig,
    error::AppError,
    images::{services::image_url, ImageUpload, MAX_IMAGE_BYTES},
    state::AppState,
    users::{
        dto::{ProfileUpdate, ProfileUpdatedResponse, UpdateProfileRequest},
        services,
    },
};

// Room for the text fields and multipart framing around a full-size image.
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 512 * 1024;

/// Routes mounted under `/api/user`; all of them sit behind the auth gate.
pub fn profile_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/with-image", put(update_profile))
        .route("/profile/image", post(upload_profile_image))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// `/api/auth/profile`, kept for clients of the older auth-prefixed paths.
pub fn profile_alias_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

fn public_base(config: &AppConfig, headers: &HeaderMap) -> String {
    if let Some(base) = &config.uploads.public_base_url {
        return base.clone();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

fn present_user(user: &User, config: &AppConfig, headers: &HeaderMap) -> PublicUser {
    let base = public_base(config, headers);
    PublicUser::from(user).with_image_url(|file| image_url(&base, file))
}

async fn read_profile_form(mut multipart: Multipart) -> Result<ProfileUpdate, AppError> {
    let mut form = ProfileUpdate::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "name" => form.name = Some(field.text().await?),
            "email" => form.email = Some(field.text().await?),
            "password" => form.password = Some(field.text().await?),
            "profileImage" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let body = field.bytes().await?;
                // browsers send an empty part when no file was picked
                if !body.is_empty() {
                    form.image = Some(ImageUpload { file_name, body });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

#[instrument(skip(state, claims, headers))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser { user_id, claims }: AuthUser,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, AppError> {
    debug!(token_exp = claims.exp, "profile read");
    let user = services::get_profile(state.users.as_ref(), user_id).await?;
    Ok(Json(present_user(&user, &state.config, &headers)))
}

/// Accepts either a JSON body or a multipart form with an optional
/// `profileImage` file.
#[instrument(skip(state, headers, req))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    headers: HeaderMap,
    req: Request,
) -> Result<Json<ProfileUpdatedResponse>, AppError> {
    let update = if is_multipart(&headers) {
        let multipart = Multipart::from_request(req, &state).await?;
        read_profile_form(multipart).await?
    } else {
        let Json(body) = Json::<UpdateProfileRequest>::from_request(req, &state).await?;
        ProfileUpdate::from(body)
    };

    let user =
        services::update_profile(state.users.as_ref(), state.storage.as_ref(), user_id, update)
            .await?;
    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated",
        user: present_user(&user, &state.config, &headers),
    }))
}

#[instrument(skip(state, headers, multipart))]
pub async fn upload_profile_image(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProfileUpdatedResponse>, AppError> {
    let form = read_profile_form(multipart?).await?;
    let user = services::replace_profile_image(
        state.users.as_ref(),
        state.storage.as_ref(),
        user_id,
        form.image,
    )
    .await?;
    Ok(Json(ProfileUpdatedResponse {
        message: "Profile image updated",
        user: present_user(&user, &state.config, &headers),
    }))
}
