pub mod cors;
pub mod hashing;
pub mod mailer;
pub mod session;
