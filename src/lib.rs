// assist-governor - outbound LLM request governor
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod governor;
pub mod limiter;
pub mod metrics;
pub mod providers;
pub mod server;
pub mod utils;
