//! Settings come from a TOML file plus `NUTRILOG__*` environment overrides.
//! `auth.signing_secret` has no default; startup fails without it.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
