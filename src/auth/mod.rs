//! HTTP Basic authentication: header parsing, password hashing and the
//! `CurrentUser` request gate.

pub mod credentials;
pub mod extractors;
pub mod password;

pub use extractors::CurrentUser;
