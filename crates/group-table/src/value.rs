use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A single cell value.
///
/// `Null` covers both "column never set" and "column explicitly empty"; the two read the same
/// everywhere in the engine. `List` only appears as the frozen result of a `distinct`
/// aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(Arc<str>),
    List(Arc<[Value]>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer coercion used by `sum`.
    ///
    /// Floats truncate toward zero; text is parsed as a base-10 integer after trimming
    /// surrounding ASCII whitespace. Returns `None` when the value has no integer reading.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => {
                let v = v.into_inner();
                if !v.is_finite() || v < i64::MIN as f64 || v >= i64::MAX as f64 {
                    return None;
                }
                Some(v.trunc() as i64)
            }
            Value::Text(s) => s
                .trim_matches(|c: char| c.is_ascii_whitespace())
                .parse::<i64>()
                .ok(),
            Value::Null | Value::List(_) => None,
        }
    }

    /// Numeric coercion used by `avg`. Text is never read as a number here.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(v.into_inner()),
            Value::Null | Value::Text(_) | Value::List(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
            Value::List(_) => 3,
        }
    }

    /// Total ordering used by `max`/`min`.
    ///
    /// `Null` sorts first, then numbers (integers and floats compare numerically), then text,
    /// then lists.
    pub fn cmp_natural(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => {
                cmp_int_float(*a, b.into_inner()).then(Ordering::Less)
            }
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, a.into_inner())
                .reverse()
                .then(Ordering::Greater),
            (Value::Text(a), Value::Text(b)) => a.as_ref().cmp(b.as_ref()),
            (Value::List(a), Value::List(b)) => {
                for (a, b) in a.iter().zip(b.iter()) {
                    let ord = a.cmp_natural(b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Exact comparison of an integer against a float, without rounding the integer through `f64`.
///
/// NaN sorts above every number, matching `OrderedFloat`.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63; every finite float below it and at or above -2^63 truncates to an exact i64.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() || f >= BOUND {
        return Ordering::Less;
    }
    if f < -BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    i.cmp(&(whole as i64)).then_with(|| {
        if f > whole {
            Ordering::Less
        } else if f < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{}", v.into_inner()),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(OrderedFloat(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(Arc::from(value))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(Arc::from(values))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
