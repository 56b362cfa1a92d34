// src/utils/mod.rs

pub mod snapshot;
pub mod visibility;
