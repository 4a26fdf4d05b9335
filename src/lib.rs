pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod master_files;
pub mod pipeline;
pub mod reader;
pub mod review;
