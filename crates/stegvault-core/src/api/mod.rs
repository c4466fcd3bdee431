pub mod embed;
pub mod extract;
mod password;

pub use password::Password;
