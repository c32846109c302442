pub mod session;

pub use session::{Session, SessionReader, SessionState};
