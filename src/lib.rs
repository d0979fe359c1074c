//! ContextOS engine: connects meetings, emails, documents and notes, learns
//! how the user moves between views, and suggests what to do next.
//!
//! Hosts construct a [`ContextEngine`], feed it events, and read its
//! queries. See `main.rs` for a JSON-lines replay host.

pub mod ambient;
pub mod behavior;
pub mod clock;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod navigation;
pub mod persistence;
pub mod store;
pub mod synthesis;
pub mod types;
pub mod util;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{ContextEngine, EngineEvent};
pub use error::EngineError;
pub use persistence::{ContextRepository, JsonFileRepository, MemoryRepository};
pub use synthesis::schedule::run_synthesis_loop;
