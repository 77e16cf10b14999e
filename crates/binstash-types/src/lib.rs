#![warn(clippy::pedantic)]

pub mod size;
pub mod stash;
pub mod value;

mod serialize;

pub use size::Size;
pub use stash::{DEFAULT_SEPARATOR, Stash};
pub use value::Value;
