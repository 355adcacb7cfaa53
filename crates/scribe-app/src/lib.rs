//! Scribe App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer). It picks host
//! callbacks or browser adapters for each port and exposes the assistant
//! to JavaScript as [`ScribeApp`].

mod app;
mod host;

pub use app::{open_scribe, ScribeApp};

use wasm_bindgen::prelude::*;

/// Runs once when the module is instantiated
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Scribe WASM starting...");
}
