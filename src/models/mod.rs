// src/models/mod.rs

pub mod exam;
pub mod level;
pub mod placement;
pub mod question;
