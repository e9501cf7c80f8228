//! Exit codes of the `roster` binary.
//!
//! Upstream and repository failures use [`roster_core::RosterError::exit_code`]
//! (1, 3, 4, 5, 6). Exit code 2 is left to clap for invalid arguments.

pub const SUCCESS: i32 = 0;
pub const INTERNAL_ERROR: i32 = 7; // Output could not be written or runtime setup failed
