pub mod jwt;
pub mod password;
pub mod email;
pub mod otp;
pub mod error;
