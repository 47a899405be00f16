// mcstage: declarative Minecraft server provisioning

pub mod cache;
pub mod checksum;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod download;
pub mod http;
pub mod install;
pub mod manifest;
pub mod shorthand;
pub mod sources;
pub mod ui;
