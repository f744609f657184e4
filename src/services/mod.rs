// src/services/mod.rs

pub mod assistant;
pub mod attempt;
