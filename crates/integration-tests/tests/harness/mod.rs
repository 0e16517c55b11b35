#![allow(dead_code)]

pub mod config;
pub mod mock_dalle;
pub mod mock_midjourney;
pub mod server;
pub mod webhook_sink;
