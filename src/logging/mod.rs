// file: src/logging/mod.rs
// version: 1.0.0
// guid: 1a7d92c5-e043-48b6-97f2-5b38a6e01d27

//! Logging initialization

pub mod logger;
