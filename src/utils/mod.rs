pub mod export;
pub mod json;
pub mod oid;
