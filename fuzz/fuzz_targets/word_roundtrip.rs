#![no_main]

use binstash_wire::{decode_word, encode_word, ByteOrder, FieldWidth, Signedness, WordSpec};
use libfuzzer_sys::fuzz_target;

// Fuzz target: fixed-width word encode->decode roundtrip.
//
// The first byte picks the width, order and signedness; the next 4 bytes
// are the value, truncated into the chosen range. Widths above 32 bits
// are left out because their values do not all survive the trip through
// f64.
fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    let width = [FieldWidth::W8, FieldWidth::W16, FieldWidth::W24, FieldWidth::W32][usize::from(data[0] & 3)];
    let order = if data[0] & 4 == 0 { ByteOrder::Little } else { ByteOrder::Big };
    let sign = if data[0] & 8 == 0 { Signedness::Unsigned } else { Signedness::Signed };
    let spec = WordSpec::new(width, order, sign);

    let raw = i64::from(u32::from_le_bytes(data[1..5].try_into().unwrap()));
    let bits = width.bits();
    let mut value = raw & ((1i64 << bits) - 1);
    if sign == Signedness::Signed && value >= 1i64 << (bits - 1) {
        value -= 1i64 << bits;
    }

    let mut buf = Vec::new();
    encode_word(value, spec, &mut buf);
    assert_eq!(buf.len(), spec.len());
    assert_eq!(decode_word(&buf, spec).unwrap(), value as f64);
});
