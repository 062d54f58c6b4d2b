pub mod config;
pub mod dispatch;
pub mod offline;
pub mod runner;
pub mod tables;
