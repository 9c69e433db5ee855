//! Template Document Tree
//!
//! This module defines the validated in-memory form of a document template
//! (Mietvertrag, Nebenkostenabrechnung, Kündigungsbestätigung, ...) as edited
//! in the rich-text editor and persisted as JSON.
//!
//! The persisted value is loosely typed (string, object, or null depending on
//! how it was saved), so these types are only ever constructed through the
//! parser in [`crate::services::template_parser`], which validates shape and
//! repairs corruption. Once constructed, the tree upholds one invariant: every
//! mention node carries a non-empty variable identifier.
//!
//! # Examples
//!
//! ```rust
//! use hausverwaltung_core::models::{TemplateDocument, TemplateNode, MentionAttrs};
//!
//! let doc = TemplateDocument {
//!     doc_type: "doc".to_string(),
//!     content: vec![TemplateNode::Paragraph {
//!         content: vec![
//!             TemplateNode::Text {
//!                 text: "Sehr geehrte/r ".to_string(),
//!                 marks: vec![],
//!             },
//!             TemplateNode::Mention {
//!                 attrs: MentionAttrs::new("tenant_name".to_string()),
//!             },
//!         ],
//!     }],
//! };
//! assert_eq!(doc.content.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// The only recognized root type tag for template documents
pub const DOC_TYPE: &str = "doc";

/// A validated template document: root type tag plus ordered child nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    /// Root type tag, always [`DOC_TYPE`] for documents built by this crate
    #[serde(rename = "type")]
    pub doc_type: String,

    /// Ordered child nodes
    pub content: Vec<TemplateNode>,
}

impl TemplateDocument {
    /// The safe fallback document: exactly one empty paragraph
    ///
    /// Every recovery path in the parser substitutes this value, so callers
    /// always receive a tree the editor can render.
    pub fn empty() -> Self {
        Self {
            doc_type: DOC_TYPE.to_string(),
            content: vec![TemplateNode::Paragraph {
                content: Vec::new(),
            }],
        }
    }

    /// Whether the document is structurally equal to the empty fallback
    pub fn is_empty(&self) -> bool {
        self == &Self::empty()
    }
}

/// One node in the template document tree
///
/// The persisted JSON uses an internal `"type"` tag. Only the kinds the editor
/// produces are represented; anything else is dropped (with a warning) at the
/// parser boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateNode {
    /// Block-level paragraph with ordered inline children
    Paragraph {
        #[serde(default)]
        content: Vec<TemplateNode>,
    },

    /// Inline text run with optional formatting marks
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<TextMark>,
    },

    /// Variable placeholder, e.g. `tenant_name` or `property_address`
    Mention { attrs: MentionAttrs },
}

/// Formatting mark on a text run (bold, italic, underline, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMark {
    #[serde(rename = "type")]
    pub mark_type: String,
}

/// Attributes of a mention node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionAttrs {
    /// Variable identifier; non-empty for every node the parser accepts
    pub id: String,

    /// Optional display label shown in the editor instead of the raw id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MentionAttrs {
    /// Create attributes for the given variable identifier
    pub fn new(id: String) -> Self {
        Self { id, label: None }
    }
}
