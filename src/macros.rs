/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Literals and other expressions go through [`to_value`](crate::to_value),
/// so Rust numbers become generic JSON numbers. Extended kinds are written
/// as expressions, e.g. `(Value::Int8(5))`.
///
/// ```rust
/// use dual_json::{json_value, Value};
///
/// let value = json_value!({
///     "name": "Alice",
///     "tags": ["a", "b"],
///     "small": (Value::Int8(5)),
///     "none": null
/// });
/// assert_eq!(value.get("small"), Some(&Value::Int8(5)));
/// ```
#[macro_export]
macro_rules! json_value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::json_value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::JsonMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::JsonMap::new();
        $(
            object.insert($key.to_string(), $crate::json_value!($value));
        )*
        $crate::Value::Object(object)
    }};

    ($e:expr) => {
        $crate::to_value(&$e).unwrap_or($crate::Value::Null)
    };
}

#[cfg(test)]
mod tests {
    use crate::{JsonMap, Number64, Value};
    use uuid::Uuid;

    #[test]
    fn test_json_value_primitives() {
        assert_eq!(json_value!(null), Value::Null);
        assert_eq!(json_value!(true), Value::Bool(true));
        assert_eq!(json_value!(42), Value::Number(Number64::Int(42)));
        assert_eq!(json_value!(3.5), Value::Number(Number64::Double(3.5)));
        assert_eq!(json_value!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_json_value_nested() {
        assert_eq!(json_value!({}), Value::Object(JsonMap::new()));
        let value = json_value!({
            "list": [1, "two", [], {}],
            "id": (Value::Guid(Uuid::nil()))
        });
        let list = value.get("list").and_then(Value::as_array).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[1], Value::from("two"));
        assert_eq!(value.get("id"), Some(&Value::Guid(Uuid::nil())));
    }
}
