// src/lib.rs

//! vacstat library
//!
//! Normalizes vacancy salaries to roubles with monthly exchange rates and
//! aggregates them into year and city statistics.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
