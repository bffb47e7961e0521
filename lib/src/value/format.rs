use crate::error::{ErrorDetail, Result};
use crate::value::{Dict, Value};

pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Parses `string` as the data format `Self` into a `T` or returns an
    /// error if `string` is not a valid `T`.
    fn from_str<T: serde::de::DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    /// Parses `string` as a dictionary. An empty or null document is an empty
    /// dictionary; any other non-dictionary document is an error.
    fn read_dict(string: &str) -> Result<Dict> {
        if string.trim().is_empty() {
            return Ok(Dict::new());
        }

        match Self::from_str::<Value>(string)? {
            Value::Null => Ok(Dict::new()),
            Value::Dict(dict) => Ok(std::sync::Arc::unwrap_or_clone(dict)),
            value => err! {
                "expected a mapping at the top level",
                "found" => value.kind(),
            },
        }
    }
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty) => (
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            fn from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Yaml: serde_yaml::from_str, serde_yaml::Error);
impl_format!(Toml: toml::from_str, toml::de::Error);
