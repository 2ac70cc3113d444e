pub mod session;

pub use session::{create_session, delete_session, resolve_session, Viewer};
