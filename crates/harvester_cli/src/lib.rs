//! tweet-harvester: command line front end for the harvester engine.
pub mod authors;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
