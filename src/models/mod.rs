// src/models/mod.rs

pub mod duration_policy;
pub mod question;
pub mod subject;
pub mod test_result;
pub mod timing_window;
pub mod user;
