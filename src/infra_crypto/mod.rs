mod password_hasher_argon2;
mod password_hasher_fake;
mod token_signer_jwt;

pub use password_hasher_argon2::*;
pub use password_hasher_fake::*;
pub use token_signer_jwt::*;
