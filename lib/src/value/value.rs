use std::sync::Arc;
use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

pub type Dict<K = Arc<str>, V = Value> = BTreeMap<K, V>;

/// Represents any valid metadata or payload value.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Num(Num),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn to_num(&self) -> Option<Num> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None
        }
    }

    pub fn into_str(self) -> Result<Arc<str>, Value> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self),
        }
    }

    pub fn into_dict(self) -> Result<Arc<Dict>, Value> {
        match self {
            Value::Dict(v) => Ok(v),
            _ => Err(self)
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

/// Merges `overlay` into `base`.
///
/// Where both sides hold a dictionary under the same key, the dictionaries are
/// merged recursively. Everywhere else the value in `overlay` replaces the one
/// in `base`, even when `base` held a dictionary and `overlay` a scalar.
///
/// ```rust
/// use stanza::dict;
/// use stanza::value::{deep_merge, Dict, Value};
///
/// let mut base = dict! { "a" => Value::from(dict! { "x" => 1 }) };
/// deep_merge(&mut base, &dict! { "a" => Value::from(dict! { "y" => 2 }) });
/// assert_eq!(base, dict! { "a" => Value::from(dict! { "x" => 1, "y" => 2 }) });
///
/// let mut base = dict! { "a" => 1 };
/// deep_merge(&mut base, &dict! { "a" => Value::from(dict! { "y" => 2 }) });
/// assert_eq!(base, dict! { "a" => Value::from(dict! { "y" => 2 }) });
/// ```
pub fn deep_merge(base: &mut Dict, overlay: &Dict) {
    for (key, value) in overlay {
        match value {
            Value::Dict(incoming) => match base.get_mut(key) {
                Some(Value::Dict(existing)) => deep_merge(Arc::make_mut(existing), incoming),
                _ => { base.insert(key.clone(), value.clone()); }
            },
            _ => { base.insert(key.clone(), value.clone()); }
        }
    }
}

/// Returns a new dictionary: `base` deep-merged with `overlay`.
pub fn deep_merged(base: &Dict, overlay: &Dict) -> Dict {
    let mut merged = base.clone();
    deep_merge(&mut merged, overlay);
    merged
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(std::borrow::Cow<'_, str> => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(u8, u16, u32, u64 => Value::Num);
impl_from_primitive!(i8, i16, i32, i64 => Value::Num);
impl_from_primitive!(f32, f64 => Value::Num);

impl From<()> for Value  {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter()
            .map(Value::from)
            .collect()
    }
}

impl<K, V> From<Dict<K, V>> for Value where Arc<str>: From<K>, Value: From<V> {
    fn from(value: Dict<K, V>) -> Self {
        let dict = value.into_iter()
            .map(|(k, v)| (<Arc::<str>>::from(k), Value::from(v)))
            .collect::<Dict>();

        Value::Dict(Arc::new(dict))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let vec = iter.into_iter().collect::<Vec<Value>>();
        Value::Array(Arc::new(vec))
    }
}

/// A signed, unsigned, or floating point number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    /// A signed integer. YAML and TOML integers land here first.
    I64(i64),
    /// An unsigned integer too large for `I64`.
    U64(u64),
    /// A floating point number.
    F64(f64),
}

impl Num {
    pub fn to_f64(self) -> f64 {
        match self {
            Num::I64(v) => v as f64,
            Num::U64(v) => v as f64,
            Num::F64(v) => v,
        }
    }

    pub fn to_i128(self) -> Option<i128> {
        match self {
            Num::I64(v) => Some(v as i128),
            Num::U64(v) => Some(v as i128),
            Num::F64(_) => None,
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_i128(), other.to_i128()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_f64() == other.to_f64(),
        }
    }
}

macro_rules! impl_from_for_num_value {
    ($($T:ty: $V:ident as $U:ty),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value as $U)
            }
        }
    )*)
}

impl_from_for_num_value! {
    u8: I64 as i64, u16: I64 as i64, u32: I64 as i64, u64: U64 as u64,
    i8: I64 as i64, i16: I64 as i64, i32: I64 as i64, i64: I64 as i64,
    f32: F64 as f64, f64: F64 as f64,
}

macro_rules! impl_try_from_value {
    ($($T:ty),+ => | $v:ident | $e:expr) => {
        $(
            impl TryFrom<$crate::value::Value> for $T {
                type Error = Value;

                fn try_from($v: $crate::value::Value) -> Result<Self, Self::Error> {
                    $e
                }
            }
        )+
    };
}

impl_try_from_value!(bool => |v| v.to_bool().ok_or(v));
impl_try_from_value!(Arc<str> => |v| v.into_str());
impl_try_from_value!(Arc<Dict> => |v| v.into_dict());
impl_try_from_value!(Num => |v| v.to_num().ok_or(v));

impl<T: TryFrom<Value, Error = Value>> TryFrom<Value> for Vec<T> {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(arc) => match Arc::try_unwrap(arc) {
                Ok(vec) => vec.into_iter().map(|v| v.try_into()).collect(),
                Err(arc) => arc.iter().cloned().map(|v| v.try_into()).collect()
            },
            value => Err(value),
        }
    }
}
