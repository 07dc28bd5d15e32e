// --- File: crates/autoservice_admin/src/lib.rs ---
// Declare modules within this crate
pub mod console;
pub mod error;
pub mod session;

pub use console::{AdminConsole, BookingRow, StatusView};
pub use error::AdminError;
pub use session::{MemorySessionStore, SessionStore, AUTH_KEY};
