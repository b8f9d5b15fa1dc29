//! Command implementations for the shotmap CLI

pub mod build;
pub mod init;
pub mod inspect;
pub mod redo;
