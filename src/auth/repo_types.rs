use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::Role;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub username: String,           // unique, 3+ chars
    pub email: String,              // unique, lowercased
    pub password_hash: String,      // Argon2 PHC string, never sent to clients
    pub role: Role,                 // access level
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Fields needed to create a user; the id is assigned by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, created_at: OffsetDateTime) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            created_at,
        }
    }
}
