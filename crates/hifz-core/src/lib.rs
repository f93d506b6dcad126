//! hifz-core: progressive recall and live-overlay engine.
//!
//! This crate decides, for every word of a memorization unit, whether it is
//! hidden, hinted, revealed, or marked correct or mistaken, combining the
//! session's hide policy with live recognition and accumulated scoring.
//! [`engine::resolve`] is the rendering contract; [`engine::Session`] and
//! [`driver::SessionDriver`] manage state over a whole session.

pub mod accumulator;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod hiding;
pub mod mock;
pub mod model;
pub mod navigation;
pub mod overlay;
pub mod parser;
pub mod policy;
pub mod traits;
pub mod words;
