pub mod error;

pub use error::handle_otp_error;
