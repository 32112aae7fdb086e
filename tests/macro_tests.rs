use dual_json::{json_value, to_binary, to_text, JsonMap, Number64, Value};
use uuid::Uuid;

#[test]
fn test_json_value_macro_null() {
    let value = json_value!(null);
    assert_eq!(value, Value::Null);
}

#[test]
fn test_json_value_macro_booleans() {
    assert_eq!(json_value!(true), Value::Bool(true));
    assert_eq!(json_value!(false), Value::Bool(false));
}

#[test]
fn test_json_value_macro_numbers() {
    assert_eq!(json_value!(42), Value::Number(Number64::Int(42)));
    assert_eq!(json_value!(3.5), Value::Number(Number64::Double(3.5)));
    assert_eq!(json_value!(-123), Value::Number(Number64::Int(-123)));
    assert_eq!(json_value!(i64::MAX), Value::Number(Number64::Int(i64::MAX)));
}

#[test]
fn test_json_value_macro_strings() {
    assert_eq!(json_value!("hello world"), Value::String("hello world".to_string()));
    assert_eq!(json_value!(""), Value::String(String::new()));
}

#[test]
fn test_json_value_macro_arrays() {
    assert_eq!(json_value!([]), Value::Array(vec![]));

    let mixed = json_value!([1, "hello", true, null, [2]]);
    assert_eq!(
        mixed,
        Value::Array(vec![
            Value::Number(Number64::Int(1)),
            Value::String("hello".to_string()),
            Value::Bool(true),
            Value::Null,
            Value::Array(vec![Value::Number(Number64::Int(2))]),
        ])
    );
}

#[test]
fn test_json_value_macro_objects() {
    assert_eq!(json_value!({}), Value::Object(JsonMap::new()));

    let user = json_value!({
        "name": "Alice",
        "age": 30,
        "address": {
            "city": "Lisbon",
            "zip": "1000-001"
        },
    });
    let object = user.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["name", "age", "address"]);
    assert_eq!(user.get("age").and_then(Value::as_i64), Some(30));
    let address = user.get("address").unwrap();
    assert_eq!(address.get("city").and_then(Value::as_str), Some("Lisbon"));
}

#[test]
fn test_json_value_macro_extended_kinds() {
    let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
    let value = json_value!({
        "small": (Value::Int8(-5)),
        "wide": (Value::UInt32(u32::MAX)),
        "id": (Value::Guid(id)),
        "raw": (Value::Binary(vec![0xFF, 0x00]))
    });

    assert_eq!(
        to_text(&value).unwrap(),
        concat!(
            r#"{"small":{"$t":8,"$v":-5},"wide":{"$t":12,"$v":4294967295},"#,
            r#""id":{"$t":16,"$v":"01234567-89ab-cdef-0123-456789abcdef"},"#,
            r#""raw":{"$t":15,"$v":"/wA="}}"#
        )
    );
    let binary = to_binary(&value).unwrap();
    assert_eq!(&binary[..5], &[0x80, 0xED, 0x2E, 0x04, 0x85]);
}

#[test]
fn test_json_value_macro_variables() {
    let name = "Bob";
    let scores = vec![1, 2];
    let value = json_value!({ "name": name, "scores": scores });
    assert_eq!(value.get("name"), Some(&Value::from("Bob")));
    assert_eq!(value.get("scores").and_then(Value::as_array).map(Vec::len), Some(2));
}
