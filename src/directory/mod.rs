//! Account directory
//!
//! The facade the application uses for accounts, roles and sessions, its
//! error type, and first-start seeding.

mod bootstrap;
mod error;
mod facade;

pub use bootstrap::{BootstrapReport, BootstrapSettings, SeededAdmin, seed};
pub use error::{DirectoryError, DirectoryOperation};
pub use facade::AccountDirectory;
