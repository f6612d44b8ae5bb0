mod accounts;
mod kv;
mod saved;
mod schema;
mod types;

pub use accounts::{AuthError, SignupForm, GUEST_USER_KEY};
pub use schema::Database;
pub use types::StorageError;
