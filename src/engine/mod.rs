// src/engine/mod.rs

pub mod classify;
pub mod placement;
pub mod scoring;
pub mod shuffle;
