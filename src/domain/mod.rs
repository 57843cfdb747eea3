pub mod entity;
pub mod incident;
pub mod query;
