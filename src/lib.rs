//! dircrypt - Password-based in-place encryption of files and directory trees

#![forbid(unsafe_code)]

pub mod atomic;
pub mod blockcrypt;
pub mod config;
pub mod container;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod password_store;
pub mod state;
pub mod token;
pub mod walk;
