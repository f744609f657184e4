// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod chat;
pub mod profile;
pub mod quiz;
pub mod results;
pub mod subjects;
