// src/application/mod.rs

pub mod state;

pub use state::AppState;
