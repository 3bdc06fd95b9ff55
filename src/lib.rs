#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! flowctl: operate a Flowdapt workflow-orchestration server from the command line.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod docs;
pub mod errors;
pub mod params;
pub mod query;
pub mod render;
pub mod resources;
pub mod types;
