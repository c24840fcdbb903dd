//! Template variable store.
//!
//! [`Variables`] is the explicit key-value scope handed to every view script
//! and layout. Values are JSON-like ([`serde_json::Value`]) so controllers can
//! assign anything serialisable.
//!
//! # Deep merge
//!
//! [`Variables::merge`] combines an incoming map into the store:
//!
//! | existing | incoming | result |
//! |----------|----------|--------|
//! | absent | any | incoming |
//! | object | object | keys merged recursively |
//! | anything else | anything else | list of existing values followed by incoming values |
//!
//! Arrays contribute their elements to the list, scalars and objects
//! contribute themselves. Merging never drops a value.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RenderError;

/// Name of the variable that holds rendered child output inside a layout.
pub const CONTENT_KEY: &str = "content";

/// Named values available to templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    map: Map<String, Value>,
}

impl Variables {
    /// Creates an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a variable set from any value that serialises to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::VariableError`] if `data` does not serialise to
    /// an object.
    pub fn from_serialize<T: Serialize>(data: &T) -> Result<Self, RenderError> {
        match serde_json::to_value(data)? {
            Value::Object(map) => Ok(Self { map }),
            Value::Null => Ok(Self::new()),
            other => Err(RenderError::VariableError(format!(
                "expected a map of variables, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Returns the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.map.insert(name.into(), value.into());
    }

    /// Returns `true` if `name` is bound to a non-null value.
    pub fn has(&self, name: &str) -> bool {
        self.map.get(name).is_some_and(|v| !v.is_null())
    }

    /// Removes the binding for `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.map.remove(name)
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Deep-merges `incoming` into this set. See the module docs for the rules.
    pub fn merge(&mut self, incoming: Map<String, Value>) {
        merge_maps(&mut self.map, incoming);
    }

    /// Iterates over the bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Consumes the set, returning the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }
}

impl From<Map<String, Value>> for Variables {
    fn from(map: Map<String, Value>) -> Self {
        Self { map }
    }
}

impl FromIterator<(String, Value)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

fn merge_maps(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match target.remove(&key) {
            None => {
                target.insert(key, value);
            }
            Some(Value::Object(mut existing)) if value.is_object() => {
                if let Value::Object(incoming) = value {
                    merge_maps(&mut existing, incoming);
                }
                target.insert(key, Value::Object(existing));
            }
            Some(existing) => {
                let mut list = into_list(existing);
                list.extend(into_list(value));
                target.insert(key, Value::Array(list));
            }
        }
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Variables {
        match value {
            Value::Object(map) => Variables::from(map),
            _ => panic!("test fixture must be an object"),
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        vars(value).into_map()
    }

    #[test]
    fn test_get_set_has_remove() {
        let mut v = Variables::new();
        assert!(v.get("title").is_none());
        assert!(!v.has("title"));

        v.set("title", "Home");
        assert_eq!(v.get("title"), Some(&json!("Home")));
        assert!(v.has("title"));

        assert_eq!(v.remove("title"), Some(json!("Home")));
        assert!(v.is_empty());
    }

    #[test]
    fn test_has_ignores_null() {
        let mut v = Variables::new();
        v.set("nothing", Value::Null);
        assert!(!v.has("nothing"));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_merge_adds_new_keys() {
        let mut v = vars(json!({"a": 1}));
        v.merge(map(json!({"b": 2})));
        assert_eq!(v.as_map(), &map(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_merge_scalar_collision_becomes_list() {
        let mut v = vars(json!({"title": "Home"}));
        v.merge(map(json!({"title": "About"})));
        assert_eq!(v.get("title"), Some(&json!(["Home", "About"])));
    }

    #[test]
    fn test_merge_lists_concatenate() {
        let mut v = vars(json!({"tags": ["a", "b"]}));
        v.merge(map(json!({"tags": ["c"]})));
        assert_eq!(v.get("tags"), Some(&json!(["a", "b", "c"])));
    }

    #[test]
    fn test_merge_list_and_scalar() {
        let mut v = vars(json!({"tags": ["a"]}));
        v.merge(map(json!({"tags": "b"})));
        assert_eq!(v.get("tags"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_merge_objects_recursively() {
        let mut v = vars(json!({"user": {"name": "ada", "roles": ["admin"]}}));
        v.merge(map(json!({"user": {"email": "ada@example.com", "roles": ["ops"]}})));
        assert_eq!(
            v.get("user"),
            Some(&json!({
                "name": "ada",
                "email": "ada@example.com",
                "roles": ["admin", "ops"]
            }))
        );
    }

    #[test]
    fn test_merge_object_with_scalar_keeps_both() {
        let mut v = vars(json!({"meta": {"a": 1}}));
        v.merge(map(json!({"meta": 5})));
        assert_eq!(v.get("meta"), Some(&json!([{"a": 1}, 5])));
    }

    #[test]
    fn test_from_serialize_struct() {
        #[derive(Serialize)]
        struct Page {
            title: String,
            count: u32,
        }

        let v = Variables::from_serialize(&Page {
            title: "Index".into(),
            count: 3,
        })
        .unwrap();
        assert_eq!(v.get("title"), Some(&json!("Index")));
        assert_eq!(v.get("count"), Some(&json!(3)));
    }

    #[test]
    fn test_from_serialize_rejects_non_map() {
        let err = Variables::from_serialize(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, RenderError::VariableError(_)));
        assert!(err.to_string().contains("a list"));
    }
}
