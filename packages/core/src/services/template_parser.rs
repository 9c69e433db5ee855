//! Template Content Parser and Recovery
//!
//! Persisted template content arrives with no schema enforced at the storage
//! boundary: a JSON-serialized string, an already-structured object, or
//! nothing at all. This module converts whatever it receives into a validated
//! [`TemplateDocument`], never panicking and never returning an unusable
//! value. The UI decides from the [`ParseResult`] whether to block saving,
//! show a recovery banner, or proceed silently.
//!
//! # Recovery Ladder
//!
//! 1. Strict JSON parse (for string input)
//! 2. Best-effort repair: strip trailing commas, close a truncated structure
//! 3. Structural validation with per-node repair (unknown kinds are dropped
//!    with a warning)
//! 4. Fallback: the empty single-paragraph document, with `success: false`
//!
//! Re-parsing a document this module produced is a structural no-op
//! (`was_recovered: false`).

use crate::models::{MentionAttrs, TemplateDocument, TemplateNode, TextMark, DOC_TYPE};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Conventional variable identifier shape; mismatches are flagged, not fatal
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Outcome of one parse attempt
///
/// `content` is always usable: on any unrecoverable failure it holds the
/// empty single-paragraph document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// False only when the input had to be replaced entirely
    pub success: bool,
    /// The validated document (possibly the empty fallback)
    pub content: TemplateDocument,
    /// Unrecoverable problems with the input
    pub errors: Vec<String>,
    /// Repairs and substitutions applied along the way
    pub warnings: Vec<String>,
    /// True when the returned tree differs from what was stored
    pub was_recovered: bool,
}

/// Outcome of walking a document for variable placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableExtraction {
    /// Mention identifiers, unique, in order of first occurrence
    pub variables: Vec<String>,
    /// Reserved for future fatal extraction problems; currently always empty
    pub errors: Vec<String>,
    /// Malformed or unconventional mentions encountered during the walk
    pub warnings: Vec<String>,
}

/// Parse a persisted template content value into a validated document
///
/// Accepts `None`, a JSON string (assumed serialized), or a structured value.
/// This function never panics and never returns an unusable document.
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::services::parse_template_content;
///
/// // Missing content is replaced by an empty document
/// let result = parse_template_content(None);
/// assert!(result.success);
/// assert!(result.was_recovered);
///
/// // Valid object input passes through untouched
/// let value = serde_json::json!({"type": "doc", "content": []});
/// let result = parse_template_content(Some(&value));
/// assert!(result.success);
/// assert!(!result.was_recovered);
/// ```
pub fn parse_template_content(raw: Option<&Value>) -> ParseResult {
    match raw {
        None | Some(Value::Null) => ParseResult {
            success: true,
            content: TemplateDocument::empty(),
            errors: Vec::new(),
            warnings: vec!["No stored content; substituted an empty document".to_string()],
            was_recovered: true,
        },
        Some(Value::String(serialized)) => parse_serialized(serialized),
        Some(value) => validate_structure(value, Vec::new(), false),
    }
}

/// Serialize a validated document back to its persisted string form
pub fn serialize_template_content(document: &TemplateDocument) -> serde_json::Result<String> {
    serde_json::to_string(document)
}

/// Extract the ordered-unique set of variable identifiers from mention nodes
///
/// A malformed mention (missing or empty id) is recorded as a warning and
/// skipped; identifiers with unconventional characters are flagged but kept.
///
/// # Examples
///
/// ```rust
/// use hausverwaltung_core::services::{extract_template_variables, parse_template_content};
///
/// let value = serde_json::json!({
///     "type": "doc",
///     "content": [{"type": "paragraph", "content": [
///         {"type": "mention", "attrs": {"id": "tenant_name"}},
///         {"type": "mention", "attrs": {"id": "property_address"}},
///         {"type": "mention", "attrs": {"id": "tenant_name"}},
///     ]}]
/// });
/// let doc = parse_template_content(Some(&value)).content;
/// let extraction = extract_template_variables(&doc);
/// assert_eq!(extraction.variables, vec!["tenant_name", "property_address"]);
/// ```
pub fn extract_template_variables(document: &TemplateDocument) -> VariableExtraction {
    let mut variables = Vec::new();
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    collect_mentions(&document.content, &mut variables, &mut seen, &mut warnings);
    VariableExtraction {
        variables,
        errors: Vec::new(),
        warnings,
    }
}

fn collect_mentions(
    nodes: &[TemplateNode],
    variables: &mut Vec<String>,
    seen: &mut HashSet<String>,
    warnings: &mut Vec<String>,
) {
    for node in nodes {
        match node {
            TemplateNode::Paragraph { content } => {
                collect_mentions(content, variables, seen, warnings);
            }
            TemplateNode::Text { .. } => {}
            TemplateNode::Mention { attrs } => {
                let id = attrs.id.trim();
                if id.is_empty() {
                    warnings
                        .push("Skipped mention node without a variable identifier".to_string());
                    continue;
                }
                if !identifier_regex().is_match(id) {
                    warnings.push(format!(
                        "Variable identifier '{id}' has unconventional characters"
                    ));
                }
                if seen.insert(id.to_string()) {
                    variables.push(id.to_string());
                }
            }
        }
    }
}

fn parse_serialized(serialized: &str) -> ParseResult {
    match serde_json::from_str::<Value>(serialized) {
        Ok(value) => validate_structure(&value, Vec::new(), false),
        Err(parse_error) => match repair_json(serialized) {
            Some((value, repair_note)) => {
                tracing::debug!("Repaired malformed template JSON: {}", repair_note);
                let warnings = vec![format!("Repaired malformed JSON ({repair_note})")];
                validate_structure(&value, warnings, true)
            }
            None => {
                tracing::warn!("Unrecoverable template content: {}", parse_error);
                fallback(
                    format!("Unparseable template content: {parse_error}"),
                    Vec::new(),
                )
            }
        },
    }
}

/// Replace the input with the empty document; the one path where `success`
/// goes false
fn fallback(error: String, mut warnings: Vec<String>) -> ParseResult {
    warnings.push("Replaced with an empty document".to_string());
    ParseResult {
        success: false,
        content: TemplateDocument::empty(),
        errors: vec![error],
        warnings,
        was_recovered: true,
    }
}

/// Validate the decoded value's shape and build the typed tree
fn validate_structure(
    value: &Value,
    mut warnings: Vec<String>,
    input_recovered: bool,
) -> ParseResult {
    let root = match value.as_object() {
        Some(root) => root,
        None => {
            return fallback(
                format!("Template root must be a JSON object, got {}", kind_of(value)),
                warnings,
            )
        }
    };

    match root.get("type").and_then(Value::as_str) {
        Some(DOC_TYPE) => {}
        Some(other) => {
            return fallback(format!("Unrecognized document type '{other}'"), warnings);
        }
        None => {
            return fallback("Document root is missing its type tag".to_string(), warnings);
        }
    }

    let warnings_at_entry = warnings.len();
    let content = match root.get("content") {
        None | Some(Value::Null) => {
            warnings.push("Document had no content; substituted an empty paragraph".to_string());
            TemplateDocument::empty().content
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| decode_node(item, &mut warnings))
            .collect(),
        Some(other) => {
            return fallback(
                format!("Document content must be an array, got {}", kind_of(other)),
                warnings,
            )
        }
    };

    let was_recovered = input_recovered || warnings.len() > warnings_at_entry;
    ParseResult {
        success: true,
        content: TemplateDocument {
            doc_type: DOC_TYPE.to_string(),
            content,
        },
        errors: Vec::new(),
        warnings,
        was_recovered,
    }
}

/// Decode one node; `None` drops it (a warning explains why)
fn decode_node(value: &Value, warnings: &mut Vec<String>) -> Option<TemplateNode> {
    let node = match value.as_object() {
        Some(node) => node,
        None => {
            warnings.push(format!("Dropped non-object node ({})", kind_of(value)));
            return None;
        }
    };

    match node.get("type").and_then(Value::as_str) {
        Some("paragraph") => {
            let content = match node.get("content") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| decode_node(item, warnings))
                    .collect(),
                Some(_) => {
                    warnings
                        .push("Paragraph content was not an array; treated as empty".to_string());
                    Vec::new()
                }
            };
            Some(TemplateNode::Paragraph { content })
        }
        Some("text") => {
            let text = match node.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None => {
                    warnings.push("Dropped text node without a text field".to_string());
                    return None;
                }
            };
            let marks = decode_marks(node.get("marks"), warnings);
            Some(TemplateNode::Text { text, marks })
        }
        Some("mention") => {
            let attrs = node.get("attrs").and_then(Value::as_object);
            // Trimmed here so the stored tree matches what extraction reports
            let raw_id = attrs
                .and_then(|attrs| attrs.get("id"))
                .and_then(Value::as_str)
                .unwrap_or("");
            let id = raw_id.trim();
            if id.is_empty() {
                warnings.push("Dropped mention node without a variable identifier".to_string());
                return None;
            }
            if id.len() != raw_id.len() {
                warnings.push(format!(
                    "Trimmed whitespace around variable identifier '{id}'"
                ));
            }
            let label = attrs
                .and_then(|attrs| attrs.get("label"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(TemplateNode::Mention {
                attrs: MentionAttrs {
                    id: id.to_string(),
                    label,
                },
            })
        }
        Some(other) => {
            warnings.push(format!("Dropped unknown node type '{other}'"));
            None
        }
        None => {
            warnings.push("Dropped node without a type tag".to_string());
            None
        }
    }
}

fn decode_marks(value: Option<&Value>, warnings: &mut Vec<String>) -> Vec<TextMark> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                match item.as_object().and_then(|mark| {
                    mark.get("type").and_then(Value::as_str)
                }) {
                    Some(mark_type) => Some(TextMark {
                        mark_type: mark_type.to_string(),
                    }),
                    None => {
                        warnings.push("Dropped malformed text mark".to_string());
                        None
                    }
                }
            })
            .collect(),
        Some(_) => {
            warnings.push("Text marks were not an array; treated as empty".to_string());
            Vec::new()
        }
    }
}

/// Best-effort repair of malformed JSON
///
/// Two passes: strip trailing commas, then close a truncated structure
/// (unterminated string, unbalanced braces/brackets). Returns the repaired
/// value and a note describing what was done, or `None` when the input is
/// beyond repair.
fn repair_json(input: &str) -> Option<(Value, &'static str)> {
    let stripped = strip_trailing_commas(input);
    if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
        return Some((value, "removed trailing commas"));
    }

    let closed = close_truncated(&stripped)?;
    serde_json::from_str::<Value>(&closed)
        .ok()
        .map(|value| (value, "closed a truncated structure"))
}

/// Remove commas that sit directly before a closing brace/bracket, the most
/// common corruption left behind by hand-edited or truncated payloads
///
/// String literals are scanned over, never rewritten, so commas inside user
/// text survive the repair.
fn strip_trailing_commas(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            output.push(ch);
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                output.push(ch);
            }
            ',' => {
                let rest = input[index + 1..].trim_start();
                if !rest.starts_with('}') && !rest.starts_with(']') {
                    output.push(ch);
                }
            }
            _ => output.push(ch),
        }
    }
    output
}

/// Append the closers a truncated JSON value is missing
///
/// Returns `None` when the input is not merely truncated (mismatched closers,
/// nothing open to close).
fn close_truncated(input: &str) -> Option<String> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in input.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
            }
            _ => {}
        }
    }

    if !in_string && stack.is_empty() {
        return None;
    }

    let mut repaired = input.to_string();
    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }
    Some(repaired)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER_REGEX.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_none_yields_empty_paragraph() {
        let result = parse_template_content(None);
        assert!(result.success);
        assert!(result.was_recovered);
        assert_eq!(result.content, TemplateDocument::empty());
        assert_eq!(result.content.content.len(), 1);
        assert!(result.errors.is_empty());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_parse_json_null_yields_empty_paragraph() {
        let result = parse_template_content(Some(&Value::Null));
        assert!(result.success);
        assert!(result.was_recovered);
        assert_eq!(result.content, TemplateDocument::empty());
    }

    #[test]
    fn test_parse_valid_object_is_not_recovered() {
        let value = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "Sehr geehrte Damen und Herren,"},
            ]}]
        });
        let result = parse_template_content(Some(&value));
        assert!(result.success);
        assert!(!result.was_recovered);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_is_idempotent_on_own_output() {
        let value = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "Miete: ", "marks": [{"type": "bold"}]},
                    {"type": "mention", "attrs": {"id": "rent_amount", "label": "Kaltmiete"}},
                ]},
                {"type": "paragraph"},
            ]
        });
        let first = parse_template_content(Some(&value));
        assert!(first.success);

        let reserialized = serde_json::to_value(&first.content).unwrap();
        let second = parse_template_content(Some(&reserialized));
        assert!(second.success);
        assert!(!second.was_recovered);
        assert_eq!(first.content, second.content);
    }

    #[test]
    fn test_parse_valid_string_input() {
        let serialized = r#"{"type":"doc","content":[{"type":"paragraph","content":[]}]}"#;
        let result = parse_template_content(Some(&json!(serialized)));
        assert!(result.success);
        assert!(!result.was_recovered);
    }

    #[test]
    fn test_trailing_comma_is_repaired() {
        let malformed = r#"{"type": "doc", "content": [{"type": "paragraph",}]}"#;
        let result = parse_template_content(Some(&json!(malformed)));
        assert!(result.success);
        assert!(result.was_recovered);
        assert!(!result.warnings.is_empty());
        assert_eq!(
            result.content.content,
            vec![TemplateNode::Paragraph {
                content: Vec::new()
            }]
        );
    }

    #[test]
    fn test_repair_leaves_commas_inside_text_alone() {
        // The trailing comma after the text node is corruption; the ",}" in
        // the text itself is user content
        let malformed = r#"{"type": "doc", "content": [{"type": "paragraph", "content": [
            {"type": "text", "text": "Kaltmiete: 1.200,}"},
        ]}]}"#;
        let result = parse_template_content(Some(&json!(malformed)));
        assert!(result.success);
        assert!(result.was_recovered);
        assert_eq!(
            result.content.content,
            vec![TemplateNode::Paragraph {
                content: vec![TemplateNode::Text {
                    text: "Kaltmiete: 1.200,}".to_string(),
                    marks: Vec::new(),
                }]
            }]
        );
    }

    #[test]
    fn test_mention_id_is_trimmed_at_decode() {
        let value = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "mention", "attrs": {"id": "  tenant_name  "}},
            ]}]
        });
        let result = parse_template_content(Some(&value));
        assert!(result.success);
        assert!(result.was_recovered);
        assert_eq!(
            result.content.content,
            vec![TemplateNode::Paragraph {
                content: vec![TemplateNode::Mention {
                    attrs: MentionAttrs {
                        id: "tenant_name".to_string(),
                        label: None,
                    }
                }]
            }]
        );

        // Stored tree and extraction agree on the identifier
        let extraction = extract_template_variables(&result.content);
        assert_eq!(extraction.variables, vec!["tenant_name".to_string()]);
    }

    #[test]
    fn test_truncated_document_is_repaired() {
        let truncated = r#"{"type": "doc", "content": [{"type": "paragraph", "content": ["#;
        let result = parse_template_content(Some(&json!(truncated)));
        assert!(result.success);
        assert!(result.was_recovered);
        assert!(result
            .warnings
            .iter()
            .any(|warning| warning.contains("truncated")));
    }

    #[test]
    fn test_garbage_string_falls_back_to_empty_document() {
        let result = parse_template_content(Some(&json!("completely invalid content")));
        assert!(!result.success);
        assert!(result.was_recovered);
        assert_eq!(result.content, TemplateDocument::empty());
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn test_wrong_root_type_falls_back() {
        let value = json!({"type": "spreadsheet", "content": []});
        let result = parse_template_content(Some(&value));
        assert!(!result.success);
        assert_eq!(result.content, TemplateDocument::empty());
        assert!(result.errors[0].contains("spreadsheet"));
    }

    #[test]
    fn test_non_array_content_falls_back() {
        let value = json!({"type": "doc", "content": "oops"});
        let result = parse_template_content(Some(&value));
        assert!(!result.success);
        assert_eq!(result.content, TemplateDocument::empty());
    }

    #[test]
    fn test_missing_content_substitutes_empty_paragraph() {
        let value = json!({"type": "doc"});
        let result = parse_template_content(Some(&value));
        assert!(result.success);
        assert!(result.was_recovered);
        assert_eq!(result.content, TemplateDocument::empty());
    }

    #[test]
    fn test_unknown_node_kinds_are_dropped_with_warning() {
        let value = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "iframe", "src": "evil"}]},
                {"type": "horizontal_rule"},
            ]
        });
        let result = parse_template_content(Some(&value));
        assert!(result.success);
        assert!(result.was_recovered);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(
            result.content.content,
            vec![TemplateNode::Paragraph {
                content: Vec::new()
            }]
        );
    }

    #[test]
    fn test_mention_without_id_is_dropped() {
        let value = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "mention", "attrs": {"id": ""}},
                {"type": "mention"},
                {"type": "mention", "attrs": {"id": "tenant_name"}},
            ]}]
        });
        let result = parse_template_content(Some(&value));
        assert!(result.success);
        assert_eq!(result.warnings.len(), 2);

        let extraction = extract_template_variables(&result.content);
        assert_eq!(extraction.variables, vec!["tenant_name".to_string()]);
    }

    #[test]
    fn test_extract_unique_in_first_occurrence_order() {
        let value = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "mention", "attrs": {"id": "tenant_name"}},
                {"type": "mention", "attrs": {"id": "property_address"}},
                {"type": "mention", "attrs": {"id": "tenant_name"}},
            ]}]
        });
        let doc = parse_template_content(Some(&value)).content;
        let extraction = extract_template_variables(&doc);
        assert_eq!(
            extraction.variables,
            vec!["tenant_name".to_string(), "property_address".to_string()]
        );
        assert!(extraction.errors.is_empty());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_extract_flags_unconventional_identifier() {
        let doc = TemplateDocument {
            doc_type: DOC_TYPE.to_string(),
            content: vec![TemplateNode::Mention {
                attrs: MentionAttrs::new("mieter-näme!".to_string()),
            }],
        };
        let extraction = extract_template_variables(&doc);
        assert_eq!(extraction.variables, vec!["mieter-näme!".to_string()]);
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_extract_skips_empty_identifier_built_in_editor() {
        // The editor can hand over a mention the parser never saw
        let doc = TemplateDocument {
            doc_type: DOC_TYPE.to_string(),
            content: vec![TemplateNode::Mention {
                attrs: MentionAttrs::new("   ".to_string()),
            }],
        };
        let extraction = extract_template_variables(&doc);
        assert!(extraction.variables.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_serialize_round_trip() {
        let value = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "Adresse: "},
                {"type": "mention", "attrs": {"id": "property_address"}},
            ]}]
        });
        let parsed = parse_template_content(Some(&value));
        let serialized = serialize_template_content(&parsed.content).unwrap();
        let reparsed = parse_template_content(Some(&json!(serialized)));
        assert!(reparsed.success);
        assert!(!reparsed.was_recovered);
        assert_eq!(parsed.content, reparsed.content);
    }

    #[test]
    fn test_close_truncated_rejects_mismatched_closers() {
        assert!(close_truncated(r#"{"a": [}"#).is_none());
        assert!(close_truncated(r#"{"a": 1}"#).is_none());
    }
}
