pub mod config;
pub mod engine;
pub mod input;
pub mod leaderboard;
pub mod model;
pub mod parser;
pub mod sandbox;
pub mod scoring;
pub mod storage;
pub mod sweep;
