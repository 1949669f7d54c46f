//! Role domain

mod entity;
mod repository;

pub use entity::{RoleName, RoleValidationError};
pub use repository::RoleRepository;

#[cfg(test)]
pub use repository::MockRoleRepository;
