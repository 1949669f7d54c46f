//! Role store implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryRoleRepository;
pub use postgres::PostgresRoleRepository;
