#![warn(clippy::pedantic)]

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod oneshot;
pub mod op;
pub mod streaming;

pub use binstash_types::{Size, Stash, Value};
pub use binstash_wire::{ByteOrder, FieldWidth, Signedness, WordSpec};
pub use config::DecoderConfig;
pub use engine::{Engine, Progress, Status};
pub use error::DecodeError;
pub use handle::{Builder, Handle, LoopControl};
pub use oneshot::Parser;
pub use op::Op;
pub use streaming::StreamParser;
