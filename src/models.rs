use serde::{Deserialize, Serialize};

/// Claims of the bearer tokens minted by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, matches `users.id`
    pub sub: String,
    /// "admin" or "employee"
    pub role: String,
    pub exp: usize,
}
