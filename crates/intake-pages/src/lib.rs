//! Page-database client: create-or-update knowledge-base pages describing
//! finished intake tasks.

pub mod client;
pub mod error;
pub mod properties;

pub use client::{PageHandle, PagesClient, PagesConfig};
pub use error::{PagesError, PagesResult};
pub use properties::{build_children, build_properties, sanitize_option_name, PageDraft};
