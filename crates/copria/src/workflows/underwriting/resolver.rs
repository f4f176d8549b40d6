use serde_json::Value;

/// Finds `field` anywhere in a nested submission.
///
/// The root is checked first, then nested objects depth-first in key order. A key on the
/// root wins even when its value is an empty string or `null`. Below the root a `null`
/// counts as a miss: that object's children are skipped and the search moves on to its
/// later siblings. Arrays are leaves and are not searched.
///
/// `None` means no usable occurrence exists, which callers must keep apart from a key
/// that exists with an empty value.
pub fn resolve<'a>(data: &'a Value, field: &str) -> Option<&'a Value> {
    let root = data.as_object()?;
    if let Some(value) = root.get(field) {
        return Some(value);
    }

    // Reverse so the first nested object is visited next.
    let mut pending: Vec<_> = root.values().rev().filter_map(Value::as_object).collect();

    while let Some(object) = pending.pop() {
        match object.get(field) {
            Some(Value::Null) => continue,
            Some(value) => return Some(value),
            None => pending.extend(object.values().rev().filter_map(Value::as_object)),
        }
    }

    None
}

/// Direct key lookup on the root object only.
pub(crate) fn direct<'a>(data: &'a Value, field: &str) -> Option<&'a Value> {
    data.as_object().and_then(|object| object.get(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_nested_values() {
        assert_eq!(resolve(&json!({ "a": { "b": 5 } }), "b"), Some(&json!(5)));
    }

    #[test]
    fn missing_fields_are_absent_not_empty() {
        assert_eq!(resolve(&json!({ "a": 1 }), "z"), None);
        assert_eq!(resolve(&json!({ "a": "" }), "a"), Some(&json!("")));
    }

    #[test]
    fn direct_keys_win_over_nested_ones() {
        let data = json!({ "COPE": { "Protection": "nested" }, "Protection": "top" });
        assert_eq!(resolve(&data, "Protection"), Some(&json!("top")));
    }

    #[test]
    fn first_branch_in_key_order_wins() {
        let data = json!({
            "Location": { "Details": { "Occupancy": "Warehouse" } },
            "COPE": { "Occupancy": "Office" }
        });
        assert_eq!(resolve(&data, "Occupancy"), Some(&json!("Warehouse")));
    }

    #[test]
    fn nested_nulls_fall_through_to_later_branches() {
        let data = json!({
            "Property Information": { "Details": { "State": null } },
            "Mailing": { "State": "TX" }
        });
        assert_eq!(resolve(&data, "State"), Some(&json!("TX")));
    }

    #[test]
    fn nested_null_hides_its_own_children() {
        let data = json!({ "Site": { "State": null, "Inner": { "State": "CA" } } });
        assert_eq!(resolve(&data, "State"), None);
    }

    #[test]
    fn root_null_is_returned_as_is() {
        let data = json!({ "State": null, "Mailing": { "State": "TX" } });
        assert_eq!(resolve(&data, "State"), Some(&Value::Null));
    }

    #[test]
    fn tolerates_deep_nesting() {
        let mut data = json!({ "Leaf": "found" });
        for depth in 0..512 {
            data = json!({ format!("level-{depth}"): data });
        }
        assert_eq!(resolve(&data, "Leaf"), Some(&json!("found")));
    }

    #[test]
    fn arrays_and_scalars_are_not_searched() {
        let data = json!({ "Buildings": [{ "Year Built": 1990 }] });
        assert_eq!(resolve(&data, "Year Built"), None);
        assert_eq!(resolve(&json!("Year Built"), "Year Built"), None);
    }

    #[test]
    fn direct_lookup_ignores_nested_objects() {
        let data = json!({ "COPE": { "Construction": "Frame" } });
        assert_eq!(direct(&data, "Construction"), None);
        assert_eq!(direct(&data, "COPE"), Some(&json!({ "Construction": "Frame" })));
    }
}
