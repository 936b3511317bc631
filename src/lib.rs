pub mod app;
pub mod build;
pub mod config;
pub mod shared;
pub mod toolchain;
pub mod workspace;
