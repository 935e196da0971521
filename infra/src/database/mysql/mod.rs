//! MySQL store implementations

pub mod identity_store_impl;
pub mod otp_store_impl;

pub use identity_store_impl::MySqlIdentityStore;
pub use otp_store_impl::MySqlOtpStore;
