pub mod connection;
pub mod meetings;
pub mod properties;
pub mod users;

pub use connection::Database;
