#![no_main]

use arbitrary::Arbitrary;
use binstash_decoder::Parser;
use libfuzzer_sys::fuzz_target;

mod layout;

use layout::{declare, Field};

#[derive(Arbitrary, Debug)]
struct Input {
    fields: Vec<Field>,
    data: Vec<u8>,
}

// Fuzz target: arbitrary layouts over arbitrary bytes.
//
// Truncation must never panic and must never read past the input;
// declaration mistakes must surface as errors, not panics.
fuzz_target!(|input: Input| {
    let mut parser = Parser::new(&input.data);
    declare(&mut parser, input.fields, 0);
    assert!(parser.tell() <= input.data.len() as u64);
    let _ = parser.finish();
});
