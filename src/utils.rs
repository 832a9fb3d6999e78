use zbus::zvariant::{Str, Value};

/// Strip any number of variant wrappers around a value.
#[must_use]
pub fn peel<'a, 'b>(mut v: &'a Value<'b>) -> &'a Value<'b> {
    while let Value::Value(inner) = v {
        v = &**inner;
    }
    v
}

#[must_use]
/// Converts a [`Value`] into [`Str`], or return [`None`] if it's not `str`.
pub fn extract_str<'a, 'b>(v: &'a Value<'b>) -> Option<&'a Str<'b>> {
    if let Value::Str(v) = peel(v) {
        Some(v)
    } else {
        None
    }
}

/// Reads a string-like value: a `str` or an object path.
#[must_use]
pub fn extract_text<'a>(v: &'a Value<'_>) -> Option<&'a str> {
    match peel(v) {
        Value::Str(s) => Some(s.as_str()),
        Value::ObjectPath(o) => Some(o.as_str()),
        _ => None,
    }
}

/// Reads the first string of an `as` array, or a lone `str`.
#[must_use]
pub fn extract_first_str<'a>(v: &'a Value<'_>) -> Option<&'a str> {
    match peel(v) {
        Value::Str(s) => Some(s.as_str()),
        Value::Array(a) => a.iter().find_map(|v| extract_str(v).map(Str::as_str)),
        _ => None,
    }
}

/// Reads any integer value that fits into an [`i64`].
#[must_use]
pub fn extract_i64(v: &Value<'_>) -> Option<i64> {
    match peel(v) {
        Value::I64(n) => Some(*n),
        Value::U64(n) => i64::try_from(*n).ok(),
        Value::I32(n) => Some(i64::from(*n)),
        Value::U32(n) => Some(i64::from(*n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::ObjectPath;

    #[test]
    fn nested_values() {
        let v = Value::Value(Box::new(Value::Value(Box::new(Value::from("x")))));
        assert_eq!(extract_str(&v).map(Str::as_str), Some("x"));
    }

    #[test]
    fn text_values() {
        let path = Value::ObjectPath(ObjectPath::from_static_str_unchecked("/a/b"));
        assert_eq!(extract_text(&path), Some("/a/b"));
        assert_eq!(extract_text(&Value::from("id")), Some("id"));
        assert_eq!(extract_text(&Value::I64(1)), None);
    }

    #[test]
    fn first_string() {
        let artists = Value::from(vec!["First", "Second"]);
        assert_eq!(extract_first_str(&artists), Some("First"));
        assert_eq!(extract_first_str(&Value::from("Solo")), Some("Solo"));
        assert_eq!(extract_first_str(&Value::from(Vec::<&str>::new())), None);
    }

    #[test]
    fn integers() {
        assert_eq!(extract_i64(&Value::I64(-3)), Some(-3));
        assert_eq!(extract_i64(&Value::U64(5)), Some(5));
        assert_eq!(extract_i64(&Value::U64(u64::MAX)), None);
        assert_eq!(extract_i64(&Value::U32(7)), Some(7));
        assert_eq!(extract_i64(&Value::F64(1.0)), None);
    }
}
