use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload identifying the holder as a user until `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: i64,    // issued at (unix seconds)
    pub exp: i64,    // expires at (unix seconds)
    pub iss: String, // issuer
    pub aud: String, // audience
}
