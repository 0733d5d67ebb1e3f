//! Warbler credential helpers
//!
//! Passwords are stored as Argon2id PHC strings (algorithm, parameters, salt
//! and digest in one field). Verification goes through `password-hash`, which
//! compares digests in constant time.
//!
//! Session secrets are random 256-bit keys used to sign session cookies.

pub mod keys;
pub mod password;
