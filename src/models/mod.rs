// src/models/mod.rs

pub mod comment;
pub mod page;
pub mod relation;
pub mod user;
