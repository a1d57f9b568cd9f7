/*
 * value.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Settee.
 *
 * Settee is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Handler that assembles parse events into a `serde_json::Value` tree.

use serde_json::{Map, Value};

use crate::json::handler::JsonContentHandler;
use crate::json::number::JsonNumber;

/// An open container plus, for objects, the key waiting for its value.
enum Frame {
    Object(Map<String, Value>, Option<String>),
    Array(Vec<Value>),
}

/// Builds one `Value` from the event stream of a single document.
#[derive(Default)]
pub struct ValueBuilder {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished top-level value, if one has been completed.
    pub fn take(&mut self) -> Option<Value> {
        self.root.take()
    }

    fn push_value(&mut self, value: Value) {
        match self.stack.last_mut() {
            Some(Frame::Object(map, key)) => {
                if let Some(k) = key.take() {
                    map.insert(k, value);
                }
            }
            Some(Frame::Array(items)) => items.push(value),
            None => self.root = Some(value),
        }
    }
}

impl JsonContentHandler for ValueBuilder {
    fn start_object(&mut self) {
        self.stack.push(Frame::Object(Map::new(), None));
    }

    fn end_object(&mut self) {
        if let Some(Frame::Object(map, _)) = self.stack.pop() {
            self.push_value(Value::Object(map));
        }
    }

    fn start_array(&mut self) {
        self.stack.push(Frame::Array(Vec::new()));
    }

    fn end_array(&mut self) {
        if let Some(Frame::Array(items)) = self.stack.pop() {
            self.push_value(Value::Array(items));
        }
    }

    fn key(&mut self, key: &str) {
        if let Some(Frame::Object(_, pending)) = self.stack.last_mut() {
            *pending = Some(key.to_string());
        }
    }

    fn number_value(&mut self, number: JsonNumber) {
        // The parser only emits finite numbers.
        if let Some(n) = number.to_number() {
            self.push_value(Value::Number(n));
        }
    }

    fn string_value(&mut self, value: &str) {
        self.push_value(Value::String(value.to_string()));
    }

    fn boolean_value(&mut self, value: bool) {
        self.push_value(Value::Bool(value));
    }

    fn null_value(&mut self) {
        self.push_value(Value::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_do_not_leak_between_levels() {
        let mut b = ValueBuilder::new();
        b.start_object();
        b.key("outer");
        b.start_object();
        b.key("inner");
        b.number_value(JsonNumber::I64(1));
        b.end_object();
        b.key("after");
        b.start_array();
        b.boolean_value(true);
        b.null_value();
        b.end_array();
        b.end_object();
        assert_eq!(
            b.take(),
            Some(json!({"outer": {"inner": 1}, "after": [true, null]}))
        );
        assert_eq!(b.take(), None);
    }
}
