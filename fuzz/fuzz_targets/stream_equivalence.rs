#![no_main]

use arbitrary::Arbitrary;
use binstash_decoder::{Parser, StreamParser};
use libfuzzer_sys::fuzz_target;

mod layout;

use layout::{declare, Field};

#[derive(Arbitrary, Debug)]
struct Input {
    fields: Vec<Field>,
    data: Vec<u8>,
    chunk: u8,
}

// Fuzz target: streaming and one-shot parsing agree.
//
// The same layout runs over the whole buffer at once and over a stream
// fed in `chunk`-byte writes. When both succeed the stashes and consumed
// byte counts must match; when one fails the other must fail too.
fuzz_target!(|input: Input| {
    let mut parser = Parser::new(&input.data);
    declare(&mut parser, input.fields.clone(), 0);
    let oneshot_tell = parser.tell();
    let oneshot = parser.finish();

    let mut stream = StreamParser::new();
    declare(&mut stream, input.fields, 0);
    let mut failed = false;
    for piece in input.data.chunks(usize::from(input.chunk.max(1))) {
        if stream.write(piece).is_err() {
            failed = true;
            break;
        }
    }
    let streamed = if failed || stream.end().is_err() { None } else { Some(stream) };

    match (oneshot, streamed) {
        (Ok(expected), Some(stream)) => {
            assert_eq!(stream.tell(), oneshot_tell);
            assert_eq!(stream.finish().unwrap(), expected);
        }
        (Err(_), None) => {}
        (oneshot, streamed) => panic!(
            "one-shot {:?} but stream {}",
            oneshot.map(|_| ()),
            if streamed.is_some() { "succeeded" } else { "failed" }
        ),
    }
});
