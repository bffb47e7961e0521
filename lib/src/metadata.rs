use std::fmt;
use std::sync::Arc;

use crate::value::{Dict, Value};

/// A typed metadata key: a well-known key name and the type of value it holds.
pub trait MetaKey: 'static {
    const KEY: &'static str;

    type Value: TryFrom<Value> + Into<Value> + fmt::Debug;
}

#[macro_export]
macro_rules! define_meta_key {
    ($($(#[$attr:meta])* $v:vis $T:ident : $key:literal => $V:ty),+ $(,)?) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy)]
            $v struct $T;

            impl $crate::metadata::MetaKey for $T {
                const KEY: &'static str = $key;
                type Value = $V;
            }
        )+
    }
}

define_meta_key! {
    /// The name of the layout wrapping a document or another layout.
    pub LayoutName : "layout" => Arc<str>,
    /// The literal line separating a post's body from its extended body.
    pub Extended : "extended" => Arc<str>,
}

pub trait DictExt {
    /// Returns the value for `K`, or `Err` with the raw value when it has the
    /// wrong type. `None` when the key is absent.
    fn get_key<K: MetaKey>(&self, key: K) -> Option<Result<K::Value, Value>>;

    fn insert_key<K: MetaKey, V: Into<K::Value>>(&mut self, key: K, value: V) -> Option<Value>;
}

impl DictExt for Dict {
    #[inline]
    fn get_key<K: MetaKey>(&self, _: K) -> Option<Result<K::Value, Value>> {
        let value = self.get(K::KEY)?;
        Some(value.clone().try_into().map_err(|_| value.clone()))
    }

    #[inline]
    fn insert_key<K: MetaKey, V: Into<K::Value>>(&mut self, _: K, value: V) -> Option<Value> {
        let value: K::Value = value.into();
        self.insert(K::KEY.into(), value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict;

    #[test]
    fn typed_lookup() {
        let mut meta = dict! { "layout" => "post", "extended" => 3 };
        assert_eq!(meta.get_key(LayoutName), Some(Ok("post".into())));
        assert_eq!(meta.get_key(Extended), Some(Err(Value::from(3))));

        meta.remove("layout");
        assert_eq!(meta.get_key(LayoutName), None);

        meta.insert_key(LayoutName, "default");
        assert_eq!(meta.get("layout"), Some(&Value::from("default")));
    }
}
