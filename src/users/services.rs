use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::hash_password_blocking,
        repo::{User, UserChanges, UserStore},
        services::{is_valid_email, normalize_email},
    },
    error::AppError,
    images::{
        services::{discard_image, store_image},
        ImageUpload,
    },
    storage::StorageClient,
    users::dto::ProfileUpdate,
};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

fn present(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn get_profile(users: &dyn UserStore, id: Uuid) -> Result<User, AppError> {
    users.find_by_id(id).await?.ok_or_else(user_not_found)
}

/// Partial update of the caller's own record. A new image replaces the
/// previous file, which is deleted once the record points at the new one.
pub async fn update_profile(
    users: &dyn UserStore,
    storage: &dyn StorageClient,
    id: Uuid,
    update: ProfileUpdate,
) -> Result<User, AppError> {
    let name = present(update.name);
    let email = present(update.email).map(|e| normalize_email(&e));
    let password = update.password.filter(|p| !p.trim().is_empty());

    if name.is_none() && email.is_none() && password.is_none() && update.image.is_none() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    if let Some(email) = &email {
        if !is_valid_email(email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::BadRequest("Invalid email format".into()));
        }
    }

    let current = get_profile(users, id).await?;

    let password_hash = match password {
        Some(p) => Some(hash_password_blocking(p).await?),
        None => None,
    };
    let new_image = match update.image {
        Some(upload) => Some(store_image(storage, upload).await?),
        None => None,
    };

    let changes = UserChanges {
        name,
        email,
        password_hash,
        profile_image: new_image.clone(),
    };
    let updated = apply(users, storage, &current, changes, new_image).await?;
    info!(user_id = %id, "profile updated");
    Ok(updated)
}

pub async fn replace_profile_image(
    users: &dyn UserStore,
    storage: &dyn StorageClient,
    id: Uuid,
    upload: Option<ImageUpload>,
) -> Result<User, AppError> {
    let upload = upload.ok_or_else(|| AppError::BadRequest("No image uploaded".into()))?;
    let current = get_profile(users, id).await?;

    let key = store_image(storage, upload).await?;
    let changes = UserChanges {
        profile_image: Some(key.clone()),
        ..Default::default()
    };
    let updated = apply(users, storage, &current, changes, Some(key)).await?;
    info!(user_id = %id, "profile image updated");
    Ok(updated)
}

/// Writes the changes; on failure the freshly stored image is removed, on
/// success the one it replaced is.
async fn apply(
    users: &dyn UserStore,
    storage: &dyn StorageClient,
    current: &User,
    changes: UserChanges,
    new_image: Option<String>,
) -> Result<User, AppError> {
    let result = match users.update(current.id, changes).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(user_not_found()),
        Err(e) => Err(AppError::from(e)),
    };

    match (&result, new_image) {
        (Err(_), Some(new)) => discard_image(storage, &new).await,
        (Ok(_), Some(new)) => {
            if let Some(old) = current.profile_image.as_deref().filter(|old| *old != new) {
                discard_image(storage, old).await;
            }
        }
        (_, None) => {}
    }
    result
}
