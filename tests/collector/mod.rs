use std::mem;

use pushjson::{Backend, Error};

/// One recorded backend callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    Str(String),
    BeginArray,
    EndArray,
    BeginObject,
    Key(String),
    EndObject,
}

/// A [`Backend`] that records every callback, used to assert on exact
/// event sequences. It can optionally be armed to fail a specific
/// callback, for exercising error propagation.
#[derive(Default)]
pub struct Collector {
    calls: Vec<Call>,
    fail_at: Option<(usize, Error)>,
}

impl Collector {
    pub fn new() -> Self {
        Collector::default()
    }

    /// Fail the zero-based `index`-th callback with `error`.
    pub fn fail_at(index: usize, error: Error) -> Self {
        Collector {
            calls: Vec::new(),
            fail_at: Some((index, error)),
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    fn record(&mut self, call: Call) -> Result<(), Error> {
        if let Some((index, error)) = self.fail_at {
            if self.calls.len() == index {
                return Err(error);
            }
        }
        self.calls.push(call);
        Ok(())
    }
}

impl Backend for Collector {
    type Result = Vec<Call>;

    fn null_value(&mut self) -> Result<(), Error> {
        self.record(Call::Null)
    }

    fn boolean_value(&mut self, v: bool) -> Result<(), Error> {
        self.record(Call::Bool(v))
    }

    fn integer_value(&mut self, v: i64) -> Result<(), Error> {
        self.record(Call::Int(v))
    }

    fn uint64_value(&mut self, v: u64) -> Result<(), Error> {
        self.record(Call::Uint(v))
    }

    fn double_value(&mut self, v: f64) -> Result<(), Error> {
        self.record(Call::Double(v))
    }

    fn string_value(&mut self, s: &str) -> Result<(), Error> {
        self.record(Call::Str(s.to_owned()))
    }

    fn begin_array(&mut self) -> Result<(), Error> {
        self.record(Call::BeginArray)
    }

    fn end_array(&mut self) -> Result<(), Error> {
        self.record(Call::EndArray)
    }

    fn begin_object(&mut self) -> Result<(), Error> {
        self.record(Call::BeginObject)
    }

    fn key(&mut self, s: &str) -> Result<(), Error> {
        self.record(Call::Key(s.to_owned()))
    }

    fn end_object(&mut self) -> Result<(), Error> {
        self.record(Call::EndObject)
    }

    fn result(&mut self) -> Self::Result {
        mem::take(&mut self.calls)
    }
}
