//! Authentication and authorization primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access-token generation and validation.
//! - [`service`] -- the register / login / deactivate unit-of-work flows.

pub mod jwt;
pub mod password;
pub mod service;
