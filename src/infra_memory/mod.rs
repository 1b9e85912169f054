mod refresh_token_store;
mod user_store_memory;

pub use refresh_token_store::*;
pub use user_store_memory::*;
