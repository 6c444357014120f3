//! Tool-call parser for LLM replies
//!
//! The collaborator embeds directives in free text using a bracketed-tag
//! syntax: `[ADD_ITEM: {...}]`, `[SET_DETAILS: {...}]`, `[SAVE_ORDER]`.
//! Parsing scans one reply for all three patterns, order-independent, at
//! most one instance each. Payloads are decoded strictly first, then through
//! a relaxed pass that tolerates Python-literal-style output (single quotes,
//! `None`, bare `...`). A payload that still fails to decode is logged and
//! treated as "no directive" - decode failures never reach the caller.

use serde_json::Value;

const ADD_ITEM_TAG: &str = "[ADD_ITEM:";
const SET_DETAILS_TAG: &str = "[SET_DETAILS:";
const SAVE_ORDER_TAG: &str = "[SAVE_ORDER]";

/// A decoded directive from one LLM reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    AddItem(AddItemDirective),
    SetDetails {
        address: Option<String>,
        phone: Option<String>,
    },
    SaveOrder,
}

/// Sanitized `ADD_ITEM` payload. Placeholder or missing name/size fields are
/// nulled out; the item is complete only when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddItemDirective {
    pub name: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub special_request: Option<String>,
}

impl AddItemDirective {
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.size.is_some()
    }
}

/// Scan a reply for directives. Well-formed input parses identically on
/// every call; the parser itself has no side effects on session state.
pub fn parse(reply: &str) -> Vec<ToolCall> {
    let mut calls = Vec::new();

    if let Some(raw) = payload_after(reply, ADD_ITEM_TAG) {
        match decode_payload(&raw) {
            Some(value) => calls.push(ToolCall::AddItem(sanitize_add_item(&value))),
            None => tracing::warn!(payload = %raw, "unparseable ADD_ITEM payload, skipping"),
        }
    }

    if let Some(raw) = payload_after(reply, SET_DETAILS_TAG) {
        match decode_payload(&raw) {
            Some(value) => {
                let address = string_field(&value, "address");
                let phone = string_field(&value, "phone");
                calls.push(ToolCall::SetDetails { address, phone });
            }
            None => tracing::warn!(payload = %raw, "unparseable SET_DETAILS payload, skipping"),
        }
    }

    if reply.contains(SAVE_ORDER_TAG) {
        calls.push(ToolCall::SaveOrder);
    }

    calls
}

/// Remove directive markup from a reply, leaving the text surfaced to the
/// user. Bracketed segments are dropped and whitespace is collapsed; an
/// all-markup reply comes back empty.
pub fn strip_directives(reply: &str) -> String {
    let mut out = String::with_capacity(reply.len());
    let mut depth_skipping = false;
    for c in reply.chars() {
        match c {
            '[' if !depth_skipping => depth_skipping = true,
            ']' if depth_skipping => depth_skipping = false,
            _ if !depth_skipping => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The `{...}` body following a tag: from the first opening brace to the
/// first closing brace, matching the non-greedy scan the prompt syntax
/// promises the collaborator.
fn payload_after(reply: &str, tag: &str) -> Option<String> {
    let start = reply.find(tag)?;
    let rest = &reply[start + tag.len()..];
    let open = rest.find('{')?;
    let close = rest[open..].find('}')?;
    Some(rest[open..=open + close].to_string())
}

fn decode_payload(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }
    serde_json::from_str::<Value>(&relaxed_to_json(raw)).ok()
}

/// Python-literal tolerance: bare ellipsis values, single quotes, None/True/False.
fn relaxed_to_json(raw: &str) -> String {
    raw.replace(": ...", ": \"...\"")
        .replace('\'', "\"")
        .replace("None", "null")
        .replace("True", "true")
        .replace("False", "false")
}

fn sanitize_add_item(value: &Value) -> AddItemDirective {
    let quantity = match value.get("quantity") {
        Some(Value::Number(n)) => n.as_u64().filter(|&n| n >= 1).map(|n| n as u32).unwrap_or(1),
        Some(Value::String(s)) => s.trim().parse().ok().filter(|&n| n >= 1).unwrap_or(1),
        _ => 1,
    };

    AddItemDirective {
        name: clean_field(value.get("name")),
        size: clean_field(value.get("size")),
        quantity,
        special_request: clean_field(value.get("special_request")),
    }
}

/// A usable slot value: a non-empty string with no placeholder marker.
fn clean_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.contains("...") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

/// `SET_DETAILS` fields are taken verbatim - the commit validator is the
/// only gate on their content.
fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_add_item() {
        let reply = r#"Got it! [ADD_ITEM: {"name": "Chicken Surprise", "size": "Large", "quantity": 2}] Anything else?"#;
        let calls = parse(reply);
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            ToolCall::AddItem(item) => {
                assert_eq!(item.name.as_deref(), Some("Chicken Surprise"));
                assert_eq!(item.size.as_deref(), Some("Large"));
                assert_eq!(item.quantity, 2);
                assert!(item.is_complete());
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn parses_relaxed_python_payload() {
        let reply = "[ADD_ITEM: {'name': 'Margherita', 'size': None, 'quantity': ...}]";
        let calls = parse(reply);
        match &calls[0] {
            ToolCall::AddItem(item) => {
                assert_eq!(item.name.as_deref(), Some("Margherita"));
                assert_eq!(item.size, None);
                assert_eq!(item.quantity, 1);
                assert!(!item.is_complete());
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn placeholder_fields_are_nulled() {
        let reply = r#"[ADD_ITEM: {"name": "...", "size": "", "quantity": "..."}]"#;
        let calls = parse(reply);
        match &calls[0] {
            ToolCall::AddItem(item) => {
                assert_eq!(item.name, None);
                assert_eq!(item.size, None);
                assert_eq!(item.quantity, 1);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn malformed_payload_degrades_to_no_directive() {
        let reply = "[ADD_ITEM: {name: oops not json]";
        assert!(parse(reply).is_empty());

        let reply = "[SET_DETAILS: {{{]";
        assert!(parse(reply).is_empty());
    }

    #[test]
    fn parsing_is_idempotent() {
        let reply = r#"Sure. [ADD_ITEM: {"name": "Four Cheese", "size": "Small", "quantity": 1}] [SAVE_ORDER]"#;
        let first = parse(reply);
        let second = parse(reply);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn set_details_partial_fields() {
        let reply = r#"[SET_DETAILS: {"phone": "03001234567"}]"#;
        let calls = parse(reply);
        assert_eq!(
            calls,
            vec![ToolCall::SetDetails {
                address: None,
                phone: Some("03001234567".to_string()),
            }]
        );
    }

    #[test]
    fn all_three_patterns_in_one_reply() {
        let reply = r#"Done [ADD_ITEM: {"name": "Margherita", "size": "Large", "quantity": 1}] and [SET_DETAILS: {"address": "12 Baker Street", "phone": "03001234567"}] now [SAVE_ORDER]"#;
        let calls = parse(reply);
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[2], ToolCall::SaveOrder));
    }

    #[test]
    fn strips_markup_from_reply() {
        let reply = r#"Added!  [ADD_ITEM: {"name": "Margherita", "size": "Large", "quantity": 1}]  Anything else?"#;
        assert_eq!(strip_directives(reply), "Added! Anything else?");
        assert_eq!(strip_directives("[SAVE_ORDER]"), "");
        assert_eq!(strip_directives("no markup at all"), "no markup at all");
    }
}
