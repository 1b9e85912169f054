mod clock;
mod password_hasher;
mod token_signer;
mod user_store;

pub use clock::*;
pub use password_hasher::*;
pub use token_signer::*;
pub use user_store::*;
