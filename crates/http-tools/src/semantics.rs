//! HTTP verb semantics.
//!
//! The five verbs exposed as tools, and the MCP `ToolAnnotations` each one advertises based on
//! RFC 9110 method semantics.

use reqwest::Method;
use rmcp::model::ToolAnnotations;
use std::fmt;

/// An HTTP verb exposed as an MCP tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    pub const ALL: [HttpVerb; 5] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Patch,
        HttpVerb::Delete,
    ];

    #[must_use]
    pub fn method(self) -> Method {
        match self {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Patch => Method::PATCH,
            HttpVerb::Delete => Method::DELETE,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        }
    }

    /// Whether the verb's tool accepts a `body` argument.
    #[must_use]
    pub fn accepts_body(self) -> bool {
        matches!(self, HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch)
    }

    /// Whether the verb's tool accepts a `queryParams` argument.
    #[must_use]
    pub fn accepts_query_params(self) -> bool {
        matches!(self, HttpVerb::Get)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate MCP tool annotations for a verb.
///
/// `openWorldHint` is always `true`: every tool talks to an external system.
#[must_use]
pub fn annotations_for_verb(verb: HttpVerb) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match verb {
        HttpVerb::Get => (true, false, Some(true)),
        HttpVerb::Post => (false, false, Some(false)),
        HttpVerb::Put | HttpVerb::Delete => (false, true, Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        HttpVerb::Patch => (false, true, None),
    };

    ToolAnnotations {
        title: None,
        read_only_hint: Some(read_only),
        destructive_hint: Some(destructive),
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_verb_is_open_world() {
        for verb in HttpVerb::ALL {
            assert_eq!(annotations_for_verb(verb).open_world_hint, Some(true));
        }
    }

    #[test]
    fn get_is_readonly_and_idempotent() {
        let a = annotations_for_verb(HttpVerb::Get);
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
    }

    #[test]
    fn patch_leaves_idempotence_unknown() {
        let a = annotations_for_verb(HttpVerb::Patch);
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.destructive_hint, Some(true));
        assert_eq!(a.idempotent_hint, None);
    }

    #[test]
    fn argument_shape_per_verb() {
        assert!(HttpVerb::Get.accepts_query_params());
        assert!(!HttpVerb::Get.accepts_body());
        assert!(HttpVerb::Post.accepts_body());
        assert!(!HttpVerb::Delete.accepts_body());
        assert!(!HttpVerb::Delete.accepts_query_params());
        assert_eq!(HttpVerb::Patch.method(), Method::PATCH);
        assert_eq!(HttpVerb::Delete.to_string(), "DELETE");
    }
}
