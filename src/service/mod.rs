//! Store access, validation, sessions and password hashing.

mod crud;
pub mod password;
pub mod session;
pub mod validation;
pub use crud::CrudService;
pub use session::{Session, SessionStore};
