use sqlx::FromRow;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,                      // assigned by the store
    pub name: Option<String>,
    pub email: String,                 // unique, normalized
    #[sqlx(rename = "password")]
    pub password_hash: String,         // Argon2 PHC string, never exposed
    pub profile_image: Option<String>, // stored filename
}

/// Fields needed to insert a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub profile_image: Option<String>,
}
