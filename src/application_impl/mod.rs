mod credential_validator;
mod session_manager;
mod session_sweeper;
mod token_issuer;

pub use credential_validator::*;
pub use session_manager::*;
pub use session_sweeper::*;
pub use token_issuer::*;
