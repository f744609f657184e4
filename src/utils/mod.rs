// src/utils/mod.rs

pub mod chat_fallback;
pub mod hash;
pub mod html;
pub mod jwt;
pub mod scoring;
pub mod timer;
