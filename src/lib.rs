//! User-based collaborative filtering recommendations on the command line.
//!
//! Userec works in two stages. The cleaning stage (the `clean` binary)
//! reads a raw user-item interaction CSV and an item CSV, anonymizes the
//! raw user identifiers into stable integer ids, drops malformed and
//! duplicate rows, pivots the result into a binary user×item presence
//! matrix and persists everything as clean artifacts. The recommendation
//! stage (the `recommend` binary) loads those artifacts and prints ranked
//! recommendations for a user: global popularity for a user without
//! history, neighbor-based collaborative filtering otherwise.

pub mod anonymize;
pub mod clean;
pub mod errors;
pub mod io;
pub mod neighbors;
pub mod recommend;
pub mod types;


pub use crate::errors::{RecError, Result};
