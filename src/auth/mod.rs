mod claims;
mod extractors;
pub mod jwt;

pub use claims::Role;
pub use extractors::{AdminUser, AuthUser};
