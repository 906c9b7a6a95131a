//! Token-based authentication.

pub mod jwt;

pub use jwt::{Claims, ClientCredentials, IssuedToken, JwtConfig, JwtService};
