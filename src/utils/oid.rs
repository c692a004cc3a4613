//! Tolerant ObjectId coercion for filters and update bodies.
//!
//! A string under an `_id` key that parses as a 24-hex ObjectId is upgraded
//! to the native type; anything that fails to parse is left untouched and
//! dispatch proceeds with the original value. Recursion descends nested
//! documents and arrays, so operator forms like `{_id: {$in: [...]}}` and
//! `{$or: [{_id: ...}]}` are covered. Values that are already ObjectIds
//! pass through unchanged.

use mongodb::bson::{oid::ObjectId, Bson, Document};

pub fn coerce_object_ids(doc: Document) -> Document {
    let mut out = Document::new();
    for (key, value) in doc {
        let coerced = if key == "_id" {
            coerce_id_value(value)
        } else {
            coerce_nested(value)
        };
        out.insert(key, coerced);
    }
    out
}

fn coerce_id_value(value: Bson) -> Bson {
    match value {
        Bson::String(s) => match ObjectId::parse_str(&s) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(s),
        },
        Bson::Document(operators) => {
            let mut out = Document::new();
            for (key, value) in operators {
                out.insert(key, coerce_id_value(value));
            }
            Bson::Document(out)
        }
        Bson::Array(items) => Bson::Array(items.into_iter().map(coerce_id_value).collect()),
        other => other,
    }
}

fn coerce_nested(value: Bson) -> Bson {
    match value {
        Bson::Document(doc) => Bson::Document(coerce_object_ids(doc)),
        Bson::Array(items) => Bson::Array(items.into_iter().map(coerce_nested).collect()),
        other => other,
    }
}
