//! Slot syntax shared by path templates and body directives.
//!
//! Text templates use `{name}` slots. Body templates are JSON values where an
//! object with a single `$`-prefixed key is a directive:
//!
//! - `{"$param": "name"}` is replaced by the parameter's value;
//! - `{"$format": "{name}データベース"}` is replaced by the rendered text;
//! - `{"$auto": {"param": "name", "then": .., "else": ..}}` picks `then` when
//!   the parameter holds the auto-generate sentinel, `else` otherwise.

use serde_json::{Map, Value};
use url::Url;

use super::catalog::is_auto_sentinel;
use crate::flow::ParamSet;

const PARAM: &str = "$param";
const FORMAT: &str = "$format";
const AUTO: &str = "$auto";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Slot(String),
}

pub fn parse_segments(template: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(format!("unclosed slot in {:?}", template));
                }
                if !is_identifier(&name) {
                    return Err(format!("invalid slot name {:?} in {:?}", name, template));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Slot(name));
            }
            '}' => return Err(format!("unmatched '}}' in {:?}", template)),
            other => text.push(other),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

pub fn validate_path(path: &str) -> Result<(), String> {
    if path.trim().is_empty() {
        return Err("path is empty".to_string());
    }
    if path.contains("://") || path.starts_with("//") {
        return Err(format!("path must be relative to the API endpoint: {:?}", path));
    }
    if path.chars().any(|ch| ch.is_whitespace() || ch == '?' || ch == '#') {
        return Err(format!("path may not contain whitespace, query or fragment: {:?}", path));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("path may not traverse upwards: {:?}", path));
    }
    parse_segments(path).map(|_| ())
}

pub fn validate_body(value: &Value) -> Result<(), String> {
    match value {
        Value::Array(items) => items.iter().try_for_each(validate_body),
        Value::Object(map) => match directive(map)? {
            Some((PARAM, arg)) => match arg.as_str() {
                Some(name) if is_identifier(name) => Ok(()),
                _ => Err(format!("$param expects a parameter name, got {}", arg)),
            },
            Some((FORMAT, arg)) => match arg.as_str() {
                Some(text) => parse_segments(text).map(|_| ()),
                None => Err(format!("$format expects a string, got {}", arg)),
            },
            Some((AUTO, arg)) => {
                let (name, then, otherwise) = auto_parts(arg)?;
                if !is_identifier(name) {
                    return Err(format!("$auto param is not a valid name: {:?}", name));
                }
                validate_body(then)?;
                validate_body(otherwise)
            }
            Some((other, _)) => Err(format!("unknown directive {}", other)),
            None => map.values().try_for_each(validate_body),
        },
        _ => Ok(()),
    }
}

/// Slot names still present in `template`, first encounter first.
pub fn text_slots(template: &str, out: &mut Vec<String>) {
    if let Ok(segments) = parse_segments(template) {
        for segment in segments {
            if let Segment::Slot(name) = segment {
                push_unique(out, name);
            }
        }
    }
}

/// Unresolved parameters of a body template in document order.
pub fn value_slots(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| value_slots(item, out)),
        Value::Object(map) => match directive(map) {
            Ok(Some((PARAM, arg))) => {
                if let Some(name) = arg.as_str() {
                    push_unique(out, name.to_string());
                }
            }
            Ok(Some((FORMAT, arg))) => {
                if let Some(text) = arg.as_str() {
                    text_slots(text, out);
                }
            }
            Ok(Some((AUTO, arg))) => {
                if let Ok((name, _, _)) = auto_parts(arg) {
                    push_unique(out, name.to_string());
                }
            }
            _ => map.values().for_each(|item| value_slots(item, out)),
        },
        _ => {}
    }
}

/// A path slot value must be one real segment once encoded. Dot segments are
/// rejected because URL resolution still collapses their percent-encoded form,
/// and control characters because the URL parser drops tabs and newlines.
pub fn check_path_value(value: &str) -> Result<(), String> {
    if value.chars().any(char::is_control) {
        return Err("value may not contain control characters".to_string());
    }
    match value.trim() {
        "" => Err("value is empty".to_string()),
        "." | ".." => Err(format!("{:?} is not allowed in a path", value.trim())),
        _ => Ok(()),
    }
}

/// Fills every path slot whose value is known and usable as a segment.
/// Values become single encoded segments; unusable values leave the slot open.
pub fn bind_path(path: &str, params: &ParamSet) -> String {
    let segments = match parse_segments(path) {
        Ok(segments) => segments,
        Err(_) => return path.to_string(),
    };
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(&text),
            Segment::Slot(name) => match params.get(&name).filter(|value| check_path_value(value).is_ok()) {
                Some(value) => out.push_str(&encode_segment(value)),
                None => {
                    out.push('{');
                    out.push_str(&name);
                    out.push('}');
                }
            },
        }
    }
    out
}

/// Resolves every directive whose parameters are known; the rest stay in place.
pub fn bind_value(value: &Value, params: &ParamSet) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| bind_value(item, params)).collect()),
        Value::Object(map) => match directive(map) {
            Ok(Some((PARAM, arg))) => match arg.as_str().and_then(|name| params.get(name)) {
                Some(bound) => Value::String(bound.to_string()),
                None => value.clone(),
            },
            Ok(Some((FORMAT, arg))) => match arg.as_str().and_then(|text| render_text(text, params)) {
                Some(rendered) => Value::String(rendered),
                None => value.clone(),
            },
            Ok(Some((AUTO, arg))) => match auto_parts(arg) {
                Ok((name, then, otherwise)) => match params.get(name) {
                    Some(bound) if is_auto_sentinel(bound) => bind_value(then, params),
                    Some(_) => bind_value(otherwise, params),
                    None => value.clone(),
                },
                Err(_) => value.clone(),
            },
            Ok(Some(_)) | Err(_) => value.clone(),
            Ok(None) => {
                let mut bound = Map::with_capacity(map.len());
                for (key, item) in map {
                    bound.insert(key.clone(), bind_value(item, params));
                }
                Value::Object(bound)
            }
        },
        other => other.clone(),
    }
}

fn render_text(template: &str, params: &ParamSet) -> Option<String> {
    let mut out = String::new();
    for segment in parse_segments(template).ok()? {
        match segment {
            Segment::Text(text) => out.push_str(&text),
            Segment::Slot(name) => out.push_str(params.get(&name)?),
        }
    }
    Some(out)
}

fn directive(map: &Map<String, Value>) -> Result<Option<(&str, &Value)>, String> {
    let has_directive = map.keys().any(|key| key.starts_with('$'));
    if !has_directive {
        return Ok(None);
    }
    if map.len() != 1 {
        return Err("directive objects take exactly one key".to_string());
    }
    Ok(map.iter().next().map(|(key, arg)| (key.as_str(), arg)))
}

fn auto_parts(arg: &Value) -> Result<(&str, &Value, &Value), String> {
    let map = arg
        .as_object()
        .ok_or_else(|| format!("$auto expects an object, got {}", arg))?;
    let name = map
        .get("param")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "$auto requires a \"param\" name".to_string())?;
    let then = map
        .get("then")
        .ok_or_else(|| "$auto requires a \"then\" value".to_string())?;
    let otherwise = map
        .get("else")
        .ok_or_else(|| "$auto requires an \"else\" value".to_string())?;
    if let Some(extra) = map.keys().find(|key| !matches!(key.as_str(), "param" | "then" | "else")) {
        return Err(format!("$auto does not accept {:?}", extra));
    }
    Ok((name, then, otherwise))
}

fn push_unique(out: &mut Vec<String>, name: String) {
    if !out.contains(&name) {
        out.push(name);
    }
}

fn encode_segment(value: &str) -> String {
    let mut scratch = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return url::form_urlencoded::byte_serialize(value.as_bytes()).collect(),
    };
    if let Ok(mut segments) = scratch.path_segments_mut() {
        segments.clear().push(value);
    }
    scratch.path().trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> ParamSet {
        let mut set = ParamSet::new();
        for (name, value) in pairs {
            set.set(name, value);
        }
        set
    }

    #[test]
    fn segments_split_text_and_slots() {
        assert_eq!(
            parse_segments("apps/{app_id}/dbs").unwrap(),
            vec![
                Segment::Text("apps/".to_string()),
                Segment::Slot("app_id".to_string()),
                Segment::Text("/dbs".to_string()),
            ]
        );
        assert!(parse_segments("apps/{app id}").is_err());
        assert!(parse_segments("apps/{app_id").is_err());
        assert!(parse_segments("apps/}").is_err());
    }

    #[test]
    fn paths_must_stay_under_the_endpoint() {
        assert!(validate_path("apps/{app_id}/dbs").is_ok());
        assert!(validate_path("https://evil.test/apps").is_err());
        assert!(validate_path("//evil.test/apps").is_err());
        assert!(validate_path("apps/../admin").is_err());
        assert!(validate_path("apps?limit=1").is_err());
        assert!(validate_path("").is_err());
    }

    #[test]
    fn body_directives_are_checked() {
        assert!(validate_body(&json!({"name": {"$param": "db_name"}})).is_ok());
        assert!(validate_body(&json!({"name": {"$eval": "1+1"}})).is_err());
        assert!(validate_body(&json!({"name": {"$param": "db_name", "x": 1}})).is_err());
        assert!(validate_body(&json!({"$auto": {"param": "db_name", "then": 1}})).is_err());
        assert!(validate_body(&json!({"$format": 3})).is_err());
    }

    #[test]
    fn slots_follow_document_order() {
        let body = json!({
            "b": {"$param": "second"},
            "a": {"$format": "{first}-{second}"},
            "c": [{"$auto": {"param": "third", "then": {}, "else": {"$param": "fourth"}}}]
        });
        let mut out = Vec::new();
        value_slots(&body, &mut out);
        assert_eq!(out, vec!["second", "first", "third"]);
    }

    #[test]
    fn path_values_are_encoded_as_one_segment() {
        let set = params(&[("app_id", "a/b {c}")]);
        assert_eq!(bind_path("apps/{app_id}/dbs", &set), "apps/a%2Fb%20%7Bc%7D/dbs");
        let set = params(&[("app_id", "%2E%2E")]);
        assert_eq!(bind_path("apps/{app_id}", &set), "apps/%252E%252E");
    }

    #[test]
    fn dot_and_empty_values_never_fill_a_path_slot() {
        for value in ["..", ".", "", "  ", " .. ", ".\t.", "4\n2"] {
            assert!(check_path_value(value).is_err(), "{:?} accepted", value);
            let set = params(&[("app_id", value)]);
            assert_eq!(bind_path("apps/{app_id}/dbs", &set), "apps/{app_id}/dbs");
        }
        assert!(check_path_value("...").is_ok());
        assert!(check_path_value("42").is_ok());
    }

    #[test]
    fn format_waits_for_all_of_its_slots() {
        let template = json!({"$format": "{a}-{b}"});
        let partial = bind_value(&template, &params(&[("a", "1")]));
        assert_eq!(partial, template);
        let full = bind_value(&template, &params(&[("a", "1"), ("b", "2")]));
        assert_eq!(full, json!("1-2"));
    }

    #[test]
    fn auto_picks_branch_by_sentinel() {
        let template = json!({"$auto": {"param": "db_name", "then": {"name": "members_db"}, "else": {"name": {"$param": "db_name"}}}});
        assert_eq!(
            bind_value(&template, &params(&[("db_name", "自動生成")])),
            json!({"name": "members_db"})
        );
        assert_eq!(
            bind_value(&template, &params(&[("db_name", "orders")])),
            json!({"name": "orders"})
        );
    }

    #[test]
    fn sentinel_outside_auto_is_literal() {
        let template = json!({"name": {"$param": "db_name"}});
        assert_eq!(
            bind_value(&template, &params(&[("db_name", "自動生成")])),
            json!({"name": "自動生成"})
        );
    }
}
