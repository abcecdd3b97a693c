// src/lib.rs

//! blip: serves a markdown site and freezes it into a static tree

pub mod error;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
