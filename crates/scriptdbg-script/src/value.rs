//! Runtime values of the demo interpreter.

use std::cell::RefCell;
use std::rc::Rc;

use scriptdbg_dap::{ObjectId, ValueKind};

/// Backing storage of a composite value. Arrays use index keys.
#[derive(Debug, Default)]
pub struct ObjectData {
    entries: Vec<(String, ScriptValue)>,
    array: bool,
}

/// A script value. Composite values are shared; clones alias the same object.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(Rc<RefCell<ObjectData>>),
}

impl ScriptValue {
    /// A new empty object.
    pub fn object() -> Self {
        ScriptValue::Object(Rc::new(RefCell::new(ObjectData::default())))
    }

    fn composite(entries: Vec<(String, ScriptValue)>, array: bool) -> Self {
        ScriptValue::Object(Rc::new(RefCell::new(ObjectData { entries, array })))
    }

    /// Build a value from JSON. Every object or array becomes a fresh composite.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ScriptValue::Null,
            Value::Bool(b) => ScriptValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ScriptValue::Int(i),
                None => ScriptValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ScriptValue::Str(s.clone()),
            Value::Array(items) => ScriptValue::composite(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), ScriptValue::from_json(v)))
                    .collect(),
                true,
            ),
            Value::Object(map) => ScriptValue::composite(
                map.iter()
                    .map(|(k, v)| (k.clone(), ScriptValue::from_json(v)))
                    .collect(),
                false,
            ),
        }
    }

    /// Convert back to JSON. `undefined` and non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            ScriptValue::Undefined | ScriptValue::Null => Value::Null,
            ScriptValue::Bool(b) => Value::Bool(*b),
            ScriptValue::Int(i) => Value::from(*i),
            ScriptValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScriptValue::Str(s) => Value::String(s.clone()),
            ScriptValue::Object(obj) => {
                let obj = obj.borrow();
                if obj.array {
                    Value::Array(obj.entries.iter().map(|(_, v)| v.to_json()).collect())
                } else {
                    Value::Object(
                        obj.entries
                            .iter()
                            .map(|(k, v)| (k.clone(), v.to_json()))
                            .collect(),
                    )
                }
            }
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ScriptValue::Undefined => ValueKind::Undefined,
            ScriptValue::Null => ValueKind::Null,
            ScriptValue::Bool(_) => ValueKind::Boolean,
            ScriptValue::Int(_) => ValueKind::Integer,
            ScriptValue::Float(_) => ValueKind::Float,
            ScriptValue::Str(_) => ValueKind::String,
            ScriptValue::Object(_) => ValueKind::Object,
        }
    }

    /// Allocation address of a composite value.
    pub fn identity(&self) -> Option<ObjectId> {
        match self {
            ScriptValue::Object(obj) => Some(ObjectId(Rc::as_ptr(obj) as usize as u64)),
            _ => None,
        }
    }

    /// String rendering used for variable values.
    pub fn display(&self) -> String {
        match self {
            ScriptValue::Undefined => "undefined".into(),
            ScriptValue::Null => "null".into(),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Int(i) => i.to_string(),
            ScriptValue::Float(f) => f.to_string(),
            ScriptValue::Str(s) => s.clone(),
            ScriptValue::Object(obj) => {
                let obj = obj.borrow();
                if obj.array {
                    obj.entries
                        .iter()
                        .map(|(_, v)| match v {
                            ScriptValue::Null | ScriptValue::Undefined => String::new(),
                            other => other.display(),
                        })
                        .collect::<Vec<_>>()
                        .join(",")
                } else {
                    "[object Object]".into()
                }
            }
        }
    }

    /// Own properties in insertion order; empty for primitives.
    pub fn properties(&self) -> Vec<(String, ScriptValue)> {
        match self {
            ScriptValue::Object(obj) => obj.borrow().entries.clone(),
            _ => Vec::new(),
        }
    }

    /// Look up a property by key.
    pub fn get(&self, key: &str) -> Option<ScriptValue> {
        match self {
            ScriptValue::Object(obj) => obj
                .borrow()
                .entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    /// Set a property, keeping the position of an existing key.
    ///
    /// Returns `false` when `self` is not an object.
    pub fn set(&self, key: &str, value: ScriptValue) -> bool {
        let ScriptValue::Object(obj) = self else {
            return false;
        };
        let mut obj = obj.borrow_mut();
        match obj.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => obj.entries.push((key.to_string(), value)),
        }
        true
    }
}
