// file: src/network/mod.rs
// version: 1.0.0
// guid: 58a1d4f7-2c90-4b36-ae85-6d13f7c02b59

//! Remote release-asset access

pub mod download;

pub use download::NetworkDownloader;
