use crate::token::{TokenWriter, WriteError};
use crate::value::{Object, Value};

// -----------------------------------------------------------------------------
// ValueWriter

/// A [`TokenWriter`] that assembles a [`Value`] tree.
///
/// Scopes are kept on a frame stack; closing a scope folds the finished
/// composite into its parent. [`into_value`](ValueWriter::into_value)
/// surrenders the root once the document is complete.
pub struct ValueWriter {
    frames: Vec<Frame>,
    root: Option<Value>,
    promote: bool,
}

enum Frame {
    Object {
        map: Object,
        pending_name: Option<String>,
    },
    Seq {
        items: Vec<Value>,
    },
}

impl ValueWriter {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            root: None,
            promote: false,
        }
    }

    /// The finished document, or `None` if nothing complete was written.
    pub fn into_value(self) -> Option<Value> {
        if self.frames.is_empty() { self.root } else { None }
    }

    fn invalid(&self, op: &'static str) -> WriteError {
        WriteError::InvalidState {
            op,
            path: self.path(),
        }
    }

    /// Places a finished value: as the promoted field name, under the
    /// pending name of the open object, into the open array, or as the
    /// document root.
    fn push_value(&mut self, op: &'static str, value: Value) -> Result<(), WriteError> {
        if self.promote {
            let name = match value {
                Value::Str(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Int(n) => n.to_string(),
                Value::Float(n) => n.to_string(),
                composite @ (Value::Null | Value::Seq(_) | Value::Object(_)) => {
                    return Err(WriteError::InvalidName {
                        kind: composite.kind_name(),
                        path: self.path(),
                    });
                }
            };
            self.promote = false;
            return self.write_name(&name);
        }
        match self.frames.last_mut() {
            Some(Frame::Object { map, pending_name }) => match pending_name.take() {
                Some(name) => {
                    map.insert(name, value);
                    Ok(())
                }
                None => Err(self.invalid(op)),
            },
            Some(Frame::Seq { items }) => {
                items.push(value);
                Ok(())
            }
            None => {
                if self.root.is_some() {
                    return Err(self.invalid(op));
                }
                self.root = Some(value);
                Ok(())
            }
        }
    }

    /// A composite about to open must have somewhere to land when it
    /// closes; checked up front so the error points at the opening call.
    fn check_open(&self, op: &'static str, kind: &'static str) -> Result<(), WriteError> {
        if self.promote {
            return Err(WriteError::InvalidName {
                kind,
                path: self.path(),
            });
        }
        match self.frames.last() {
            Some(Frame::Object {
                pending_name: None, ..
            }) => Err(self.invalid(op)),
            None if self.root.is_some() => Err(self.invalid(op)),
            _ => Ok(()),
        }
    }
}

impl Default for ValueWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenWriter for ValueWriter {
    fn begin_object(&mut self) -> Result<(), WriteError> {
        self.check_open("begin an object", "object")?;
        self.frames.push(Frame::Object {
            map: Object::new(),
            pending_name: None,
        });
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), WriteError> {
        match self.frames.last() {
            Some(Frame::Object {
                pending_name: None, ..
            }) => {}
            _ => return Err(self.invalid("end an object")),
        }
        let Some(Frame::Object { map, .. }) = self.frames.pop() else {
            unreachable!("frame checked above");
        };
        self.push_value("end an object", Value::Object(map))
    }

    fn begin_array(&mut self) -> Result<(), WriteError> {
        self.check_open("begin an array", "array")?;
        self.frames.push(Frame::Seq { items: Vec::new() });
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), WriteError> {
        match self.frames.last() {
            Some(Frame::Seq { .. }) => {}
            _ => return Err(self.invalid("end an array")),
        }
        let Some(Frame::Seq { items }) = self.frames.pop() else {
            unreachable!("frame checked above");
        };
        self.push_value("end an array", Value::Seq(items))
    }

    fn write_name(&mut self, name: &str) -> Result<(), WriteError> {
        match self.frames.last_mut() {
            Some(Frame::Object {
                pending_name: pending @ None,
                ..
            }) => {
                *pending = Some(name.to_string());
                Ok(())
            }
            _ => Err(self.invalid("write a field name")),
        }
    }

    fn write_bool(&mut self, value: bool) -> Result<(), WriteError> {
        self.push_value("write a boolean", Value::Bool(value))
    }

    fn write_int(&mut self, value: i64) -> Result<(), WriteError> {
        self.push_value("write an integer", Value::Int(value))
    }

    fn write_float(&mut self, value: f64) -> Result<(), WriteError> {
        self.push_value("write a float", Value::Float(value))
    }

    fn write_str(&mut self, value: &str) -> Result<(), WriteError> {
        self.push_value("write a string", Value::Str(value.to_string()))
    }

    fn write_null(&mut self) -> Result<(), WriteError> {
        self.push_value("write null", Value::Null)
    }

    fn promote_value_to_name(&mut self) -> Result<(), WriteError> {
        match self.frames.last() {
            Some(Frame::Object {
                pending_name: None, ..
            }) => {
                self.promote = true;
                Ok(())
            }
            _ => Err(self.invalid("promote a value to a field name")),
        }
    }

    fn path(&self) -> String {
        let mut out = String::from("$");
        for frame in &self.frames {
            match frame {
                Frame::Object { pending_name, .. } => {
                    if let Some(name) = pending_name {
                        out.push('.');
                        out.push_str(name);
                    }
                }
                Frame::Seq { items } => {
                    out.push_str(&format!("[{}]", items.len()));
                }
            }
        }
        out
    }
}
