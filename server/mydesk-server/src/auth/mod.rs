//! Authentication and role hierarchy

pub mod passwords;
pub mod roles;
pub mod tokens;
pub mod users;

pub use roles::{is_authorized, Role};
pub use tokens::{TokenClaims, TokenService};
pub use users::{User, UserStore};
