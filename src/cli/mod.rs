// file: src/cli/mod.rs
// version: 1.0.0
// guid: 3d90b5e7-48c2-4f16-a9d3-60e85b27c1f4

//! Command line interface

pub mod args;
pub mod commands;
pub mod menu;
