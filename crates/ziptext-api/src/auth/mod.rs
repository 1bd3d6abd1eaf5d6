//! Bearer-token authentication.
//!
//! Every versioned route requires `Authorization: Bearer <jwt>` signed with
//! HS256 and the configured secret. The verified identity is placed in the
//! request extensions as a [`UserContext`].

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtService;
pub use models::{JwtClaims, UserContext};
