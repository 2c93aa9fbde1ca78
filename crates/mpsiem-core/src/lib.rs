//! mpsiem Core Types
//!
//! This crate provides the fundamental types shared by the mpsiem crates:
//! - Filter and folder data model
//! - Core error types

pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{
    FilterDetail, FilterDetailPdql, FilterEntry, FilterMap, FilterQuery, FolderEntry, FolderMap,
};
