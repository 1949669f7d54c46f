//! Identity provider assembled from the account and role stores

mod provider;

pub use provider::{IdentityOptions, StoreIdentityProvider};
