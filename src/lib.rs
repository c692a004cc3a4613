//! Browser-facing MongoDB administration backend.
//!
//! Two pieces make up the core: the [`mongo::registry::ClientRegistry`],
//! which caches one pooled client per connection string, and the request
//! handlers in [`app::handlers`], which translate validated HTTP requests
//! into single driver operations.

pub mod app;
pub mod error;
pub mod mongo;
pub mod utils;
