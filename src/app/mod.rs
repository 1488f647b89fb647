pub mod commands;

pub use commands::{authorize, list_advertisers, run_batch, verify, RunOptions};
