//! Account domain
//!
//! Account entity, validation rules and the persistence port.

mod entity;
mod repository;
mod validation;

pub use entity::{Account, AccountId, AccountStatus, normalize_key};
pub use repository::AccountRepository;
pub use validation::{
    AccountValidationError, PasswordPolicy, validate_account_id, validate_email,
    validate_user_name,
};

#[cfg(test)]
pub use repository::MockAccountRepository;
