pub mod app;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod models;
pub mod storage;
pub mod tmdb;
pub mod utils;
