pub mod admin;
pub mod aggregation;
pub mod crud;
pub mod query;
pub mod registry;
