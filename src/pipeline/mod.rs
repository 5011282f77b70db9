//! Pipeline stages for poster generation.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on its own and the two stages with external dependencies (the
//! model and the browser) can be swapped for fakes behind their traits.
//!
//! ## Data Flow
//!
//! ```text
//! prompt ──▶ llm ──▶ extract ──▶ embed ──▶ render
//!           (model)  (fence)    (logo)    (Chromium)
//! ```
//!
//! 1. [`llm`]    : the single generation call; the only stage talking to the model
//! 2. [`extract`]: isolate the fenced markup document from the reply
//! 3. [`embed`]  : inline the logo as a data URI at the placeholder
//! 4. [`render`] : load the markup in a fresh headless browser and export
//!
//! [`input`] sits in front of all of them and turns CLI arguments (paths,
//! URLs) into the in-memory records the pipeline consumes.

pub mod embed;
pub mod extract;
pub mod input;
pub mod llm;
pub mod render;
