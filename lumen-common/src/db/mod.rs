//! Database schema, initialization and user records

pub mod init;
pub mod users;

pub use init::*;
pub use users::*;
