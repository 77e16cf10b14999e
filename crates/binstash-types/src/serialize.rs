use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::stash::Stash;
use crate::value::Value;

// Hand-written so maps keep insertion order and numbers that are whole
// render without a trailing `.0`.

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Number(n) => match self.as_i64() {
                Some(i) if n.abs() < 2f64.powi(53) => serializer.serialize_i64(i),
                _ => serializer.serialize_f64(*n),
            },
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => b.serialize(serializer),
            Value::Map(m) => m.serialize(serializer),
        }
    }
}

impl Serialize for Stash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_in_insertion_order() {
        let mut stash = Stash::new();
        stash.set("z", 1);
        stash.set("a.b", "hi");
        stash.set("n", Value::Null);
        stash.set("raw", vec![1u8, 2]);
        stash.set("half", 0.5);

        let json = serde_json::to_string(&stash).unwrap();
        assert_eq!(json, r#"{"z":1,"a":{"b":"hi"},"n":null,"raw":[1,2],"half":0.5}"#);
    }
}
