pub mod auth;

pub use auth::{authenticate, Caller, Claims, JwtTokenVerifier, MaybeCaller};
