//! Infrastructure layer - storage, hashing, sessions and the identity provider

pub mod account;
pub mod identity;
pub mod logging;
pub mod password;
pub mod role;
pub mod session;
pub mod storage;
