#![warn(clippy::pedantic)]

pub mod error;
pub mod scan;
pub mod text;
pub mod word;

pub use error::WireError;
pub use scan::DelimiterScanner;
pub use text::{decode_cstring, decode_string};
pub use word::{ByteOrder, FieldWidth, Signedness, WordSpec, decode_word, encode_word};
