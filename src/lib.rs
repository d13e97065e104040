//! Pokedex library
//!
//! The response cache, PokeAPI client, discovery tracker, party and save file
//! gateway, plus the session, command and REPL layers built on them.

pub mod api;
pub mod app;
pub mod cache;
pub mod catch;
pub mod cli;
pub mod commands;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod party;
pub mod persistence;
pub mod repl;
