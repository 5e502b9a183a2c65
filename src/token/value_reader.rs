use crate::token::{Peek, ReadError, TokenReader};
use crate::value::Value;

// -----------------------------------------------------------------------------
// ValueReader

/// A [`TokenReader`] over an in-memory [`Value`] tree.
///
/// The reader keeps a stack of frames mirroring the open scopes; each
/// frame remembers how far through its composite it has advanced. Scalar
/// reads resolve the "due" value at the top of the stack, so misdirected
/// calls (a value read where a name is due, a read past the end of a
/// scope) fail with the structural path attached.
pub struct ValueReader<'a> {
    frames: Vec<Frame<'a>>,
}

#[derive(Clone, Copy)]
enum Frame<'a> {
    Root {
        value: &'a Value,
        consumed: bool,
    },
    Seq {
        items: &'a [Value],
        next: usize,
    },
    Object {
        entries: &'a [(String, Value)],
        next: usize,
        name_consumed: bool,
        promote: bool,
    },
}

/// What the top frame will deliver next.
enum Due<'a> {
    Value(&'a Value),
    Name(&'a str),
    PromotedName(&'a str),
    End(Peek),
}

fn peek_of(value: &Value) -> Peek {
    match value {
        Value::Null => Peek::Null,
        Value::Bool(_) => Peek::Bool,
        Value::Int(_) => Peek::Int,
        Value::Float(_) => Peek::Float,
        Value::Str(_) => Peek::Str,
        Value::Seq(_) => Peek::BeginArray,
        Value::Object(_) => Peek::BeginObject,
    }
}

impl<'a> ValueReader<'a> {
    /// Creates a reader positioned at the root of `value`.
    pub fn new(value: &'a Value) -> Self {
        Self {
            frames: vec![Frame::Root {
                value,
                consumed: false,
            }],
        }
    }

    fn due(&self) -> Due<'a> {
        match self.frames.last().copied() {
            None => Due::End(Peek::EndOfDocument),
            Some(Frame::Root { value, consumed }) => {
                if consumed {
                    Due::End(Peek::EndOfDocument)
                } else {
                    Due::Value(value)
                }
            }
            Some(Frame::Seq { items, next }) => match items.get(next) {
                Some(item) => Due::Value(item),
                None => Due::End(Peek::EndArray),
            },
            Some(Frame::Object {
                entries,
                next,
                name_consumed,
                promote,
            }) => match entries.get(next) {
                None => Due::End(Peek::EndObject),
                Some((name, value)) => {
                    if name_consumed {
                        Due::Value(value)
                    } else if promote {
                        Due::PromotedName(name)
                    } else {
                        Due::Name(name)
                    }
                }
            },
        }
    }

    /// Advances past the due value (or promoted name) of the top frame.
    fn consume(&mut self) {
        match self.frames.last_mut() {
            Some(Frame::Root { consumed, .. }) => *consumed = true,
            Some(Frame::Seq { next, .. }) => *next += 1,
            Some(Frame::Object {
                next,
                name_consumed,
                promote,
                ..
            }) => {
                if *name_consumed {
                    *next += 1;
                    *name_consumed = false;
                } else {
                    // A promoted name was read; its value is now due.
                    *promote = false;
                    *name_consumed = true;
                }
            }
            None => {}
        }
    }

    fn unexpected(&self, expected: &'static str, found: Peek) -> ReadError {
        ReadError::UnexpectedToken {
            expected,
            found: found.name(),
            path: self.path(),
        }
    }

    /// Resolves the due scalar-or-composite value, or errors naming what
    /// was found instead.
    fn due_value(&self, expected: &'static str) -> Result<&'a Value, ReadError> {
        match self.due() {
            Due::Value(value) => Ok(value),
            Due::Name(_) => Err(self.unexpected(expected, Peek::Name)),
            Due::PromotedName(_) => Err(self.unexpected(expected, Peek::Str)),
            Due::End(Peek::EndOfDocument) => Err(ReadError::UnexpectedEnd { path: self.path() }),
            Due::End(end) => Err(self.unexpected(expected, end)),
        }
    }
}

impl TokenReader for ValueReader<'_> {
    fn begin_object(&mut self) -> Result<(), ReadError> {
        match self.due_value("an object")? {
            Value::Object(map) => {
                self.consume();
                self.frames.push(Frame::Object {
                    entries: map.entries(),
                    next: 0,
                    name_consumed: false,
                    promote: false,
                });
                Ok(())
            }
            other => Err(self.unexpected("an object", peek_of(other))),
        }
    }

    fn end_object(&mut self) -> Result<(), ReadError> {
        match self.due() {
            Due::End(Peek::EndObject) => {
                self.frames.pop();
                Ok(())
            }
            Due::Value(value) => Err(self.unexpected("end of object", peek_of(value))),
            Due::Name(_) => Err(self.unexpected("end of object", Peek::Name)),
            Due::PromotedName(_) => Err(self.unexpected("end of object", Peek::Str)),
            Due::End(end) => Err(self.unexpected("end of object", end)),
        }
    }

    fn begin_array(&mut self) -> Result<(), ReadError> {
        match self.due_value("an array")? {
            Value::Seq(items) => {
                self.consume();
                self.frames.push(Frame::Seq { items, next: 0 });
                Ok(())
            }
            other => Err(self.unexpected("an array", peek_of(other))),
        }
    }

    fn end_array(&mut self) -> Result<(), ReadError> {
        match self.due() {
            Due::End(Peek::EndArray) => {
                self.frames.pop();
                Ok(())
            }
            Due::Value(value) => Err(self.unexpected("end of array", peek_of(value))),
            Due::Name(_) => Err(self.unexpected("end of array", Peek::Name)),
            Due::PromotedName(_) => Err(self.unexpected("end of array", Peek::Str)),
            Due::End(end) => Err(self.unexpected("end of array", end)),
        }
    }

    fn has_next(&mut self) -> Result<bool, ReadError> {
        Ok(!matches!(self.due(), Due::End(_)))
    }

    fn next_name(&mut self) -> Result<String, ReadError> {
        match self.due() {
            Due::Name(name) => {
                let name = name.to_string();
                match self.frames.last_mut() {
                    Some(Frame::Object { name_consumed, .. }) => *name_consumed = true,
                    _ => unreachable!("name due outside an object scope"),
                }
                Ok(name)
            }
            Due::Value(value) => Err(self.unexpected("a field name", peek_of(value))),
            Due::PromotedName(_) => Err(self.unexpected("a field name", Peek::Str)),
            Due::End(Peek::EndOfDocument) => Err(ReadError::UnexpectedEnd { path: self.path() }),
            Due::End(end) => Err(self.unexpected("a field name", end)),
        }
    }

    fn next_bool(&mut self) -> Result<bool, ReadError> {
        match self.due_value("a boolean")? {
            Value::Bool(b) => {
                let b = *b;
                self.consume();
                Ok(b)
            }
            other => Err(self.unexpected("a boolean", peek_of(other))),
        }
    }

    fn next_int(&mut self) -> Result<i64, ReadError> {
        match self.due_value("an integer")? {
            Value::Int(n) => {
                let n = *n;
                self.consume();
                Ok(n)
            }
            other => Err(self.unexpected("an integer", peek_of(other))),
        }
    }

    fn next_float(&mut self) -> Result<f64, ReadError> {
        match self.due_value("a number")? {
            Value::Float(n) => {
                let n = *n;
                self.consume();
                Ok(n)
            }
            Value::Int(n) => {
                let n = *n as f64;
                self.consume();
                Ok(n)
            }
            other => Err(self.unexpected("a number", peek_of(other))),
        }
    }

    fn next_str(&mut self) -> Result<String, ReadError> {
        if let Due::PromotedName(name) = self.due() {
            let name = name.to_string();
            self.consume();
            return Ok(name);
        }
        match self.due_value("a string")? {
            Value::Str(s) => {
                let s = s.clone();
                self.consume();
                Ok(s)
            }
            other => Err(self.unexpected("a string", peek_of(other))),
        }
    }

    fn next_null(&mut self) -> Result<(), ReadError> {
        match self.due_value("null")? {
            Value::Null => {
                self.consume();
                Ok(())
            }
            other => Err(self.unexpected("null", peek_of(other))),
        }
    }

    fn peek(&mut self) -> Result<Peek, ReadError> {
        Ok(match self.due() {
            Due::Value(value) => peek_of(value),
            Due::Name(_) => Peek::Name,
            Due::PromotedName(_) => Peek::Str,
            Due::End(end) => end,
        })
    }

    fn skip_value(&mut self) -> Result<(), ReadError> {
        match self.due() {
            // Values are whole subtrees here, so discarding is one step.
            Due::Value(_) | Due::PromotedName(_) => {
                self.consume();
                Ok(())
            }
            Due::Name(_) => {
                // Discard the whole entry.
                match self.frames.last_mut() {
                    Some(Frame::Object { next, .. }) => {
                        *next += 1;
                        Ok(())
                    }
                    _ => unreachable!("name due outside an object scope"),
                }
            }
            Due::End(Peek::EndOfDocument) => Err(ReadError::UnexpectedEnd { path: self.path() }),
            Due::End(end) => Err(self.unexpected("a value", end)),
        }
    }

    fn promote_name_to_value(&mut self) -> Result<(), ReadError> {
        match self.frames.last_mut() {
            Some(Frame::Object {
                promote,
                name_consumed: false,
                ..
            }) => {
                *promote = true;
                Ok(())
            }
            _ => Err(ReadError::UnexpectedToken {
                expected: "a field name",
                found: "a value",
                path: self.path(),
            }),
        }
    }

    fn path(&self) -> String {
        let mut out = String::from("$");
        for frame in &self.frames {
            match frame {
                Frame::Root { .. } => {}
                Frame::Seq { next, .. } => {
                    out.push_str(&format!("[{next}]"));
                }
                Frame::Object { entries, next, .. } => {
                    if let Some((name, _)) = entries.get(*next) {
                        out.push('.');
                        out.push_str(name);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn sample() -> Value {
        Value::Object(Object::from([
            ("name".to_string(), Value::Str("ada".to_string())),
            (
                "scores".to_string(),
                Value::Seq(vec![Value::Int(1), Value::Int(2)]),
            ),
            ("gone".to_string(), Value::Null),
        ]))
    }

    #[test]
    fn walks_a_tree() {
        let value = sample();
        let mut reader = ValueReader::new(&value);
        reader.begin_object().unwrap();
        assert_eq!(reader.next_name().unwrap(), "name");
        assert_eq!(reader.next_str().unwrap(), "ada");
        assert_eq!(reader.next_name().unwrap(), "scores");
        reader.begin_array().unwrap();
        assert_eq!(reader.next_int().unwrap(), 1);
        assert_eq!(reader.next_int().unwrap(), 2);
        assert!(!reader.has_next().unwrap());
        reader.end_array().unwrap();
        assert_eq!(reader.next_name().unwrap(), "gone");
        assert_eq!(reader.peek().unwrap(), Peek::Null);
        reader.next_null().unwrap();
        reader.end_object().unwrap();
        assert_eq!(reader.peek().unwrap(), Peek::EndOfDocument);
    }

    #[test]
    fn promoted_name_reads_as_string() {
        let value = sample();
        let mut reader = ValueReader::new(&value);
        reader.begin_object().unwrap();
        reader.promote_name_to_value().unwrap();
        assert_eq!(reader.peek().unwrap(), Peek::Str);
        assert_eq!(reader.next_str().unwrap(), "name");
        assert_eq!(reader.next_str().unwrap(), "ada");
    }

    #[test]
    fn skip_on_a_name_discards_the_entry() {
        let value = sample();
        let mut reader = ValueReader::new(&value);
        reader.begin_object().unwrap();
        reader.skip_value().unwrap();
        assert_eq!(reader.next_name().unwrap(), "scores");
    }

    #[test]
    fn path_tracks_position() {
        let value = sample();
        let mut reader = ValueReader::new(&value);
        reader.begin_object().unwrap();
        assert_eq!(reader.path(), "$.name");
        reader.next_name().unwrap();
        reader.next_str().unwrap();
        reader.next_name().unwrap();
        reader.begin_array().unwrap();
        reader.next_int().unwrap();
        assert_eq!(reader.path(), "$.scores[1]");
    }

    #[test]
    fn wrong_kind_reports_expected_and_found() {
        let value = Value::Int(7);
        let mut reader = ValueReader::new(&value);
        let err = reader.next_str().unwrap_err();
        assert!(matches!(
            err,
            ReadError::UnexpectedToken {
                expected: "a string",
                found: "an integer",
                ..
            }
        ));
    }
}
