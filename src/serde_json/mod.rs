//! Compatibility adapter that parses into a Serde JSON [`Value`].
//!
//! Heads up: this module exists for testing and interoperability. If all
//! your documents fit into memory and you always want a `Value`, you are
//! most likely better off using Serde JSON directly.

use serde_json::{Map, Number, Value};

use crate::{Backend, Error, Parser};

/// A [`Backend`] that assembles a Serde JSON [`Value`].
///
/// Containers under construction live on a stack together with the key
/// under which each will eventually be inserted into its parent.
#[derive(Default)]
struct ValueBackend {
    stack: Vec<(Option<String>, Value)>,
    current_key: Option<String>,
    result: Option<Value>,
}

impl ValueBackend {
    fn put(&mut self, v: Value) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some((_, Value::Object(m))) => {
                if let Some(key) = self.current_key.take() {
                    m.insert(key, v);
                }
            }
            Some((_, Value::Array(a))) => a.push(v),
            _ => self.result = Some(v),
        }
        Ok(())
    }
}

impl Backend for ValueBackend {
    type Result = Option<Value>;

    fn null_value(&mut self) -> Result<(), Error> {
        self.put(Value::Null)
    }

    fn boolean_value(&mut self, v: bool) -> Result<(), Error> {
        self.put(Value::Bool(v))
    }

    fn integer_value(&mut self, v: i64) -> Result<(), Error> {
        self.put(Value::Number(Number::from(v)))
    }

    fn uint64_value(&mut self, v: u64) -> Result<(), Error> {
        self.put(Value::Number(Number::from(v)))
    }

    fn double_value(&mut self, v: f64) -> Result<(), Error> {
        let n = Number::from_f64(v).ok_or(Error::NumberOutOfRange)?;
        self.put(Value::Number(n))
    }

    fn string_value(&mut self, s: &str) -> Result<(), Error> {
        self.put(Value::String(s.to_owned()))
    }

    fn begin_array(&mut self) -> Result<(), Error> {
        self.stack.push((self.current_key.take(), Value::Array(vec![])));
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), Error> {
        if let Some((key, v)) = self.stack.pop() {
            self.current_key = key;
            self.put(v)?;
        }
        Ok(())
    }

    fn begin_object(&mut self) -> Result<(), Error> {
        self.stack
            .push((self.current_key.take(), Value::Object(Map::new())));
        Ok(())
    }

    fn key(&mut self, s: &str) -> Result<(), Error> {
        self.current_key = Some(s.to_owned());
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), Error> {
        if let Some((key, v)) = self.stack.pop() {
            self.current_key = key;
            self.put(v)?;
        }
        Ok(())
    }

    fn result(&mut self) -> Self::Result {
        self.result.take()
    }
}

/// Parse a byte slice into a Serde JSON [`Value`].
///
/// ```
/// use pushjson::serde_json::from_slice;
///
/// let json = br#"{"name": "Grace"}"#;
/// let value = from_slice(json).unwrap();
///
/// assert!(value.is_object());
/// assert_eq!(value["name"], "Grace");
/// ```
pub fn from_slice(v: &[u8]) -> Result<Value, Error> {
    let mut parser = Parser::new(ValueBackend::default());
    parser.input(v);
    parser.eof()?.ok_or(Error::ExpectedToken)
}
