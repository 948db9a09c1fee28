//! different utility modules used throughout the project
/// logging set-up: terminal plus time-stamped file
pub mod logger;
