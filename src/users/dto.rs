use serde::{Deserialize, Serialize};

use crate::{auth::dto::PublicUser, images::ImageUpload};

/// JSON form of a profile update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Requested profile changes, from JSON or multipart.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<ImageUpload>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
            image: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: &'static str,
    pub user: PublicUser,
}
