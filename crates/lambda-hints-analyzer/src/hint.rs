//! Hint records handed to the presentation layer

use lambda_hints_syntax::NodeId;
use serde::Serialize;

/// Prefix of every lambda return hint
pub const HINT_PREFIX: char = '^';

/// One inlay hint marking an implicit lambda result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaReturnHint {
    /// Text shown in the editor, e.g. `^map`
    pub display_text: String,
    /// Byte offset right after the result expression
    pub anchor_offset: usize,
    /// Lambda expression the hint belongs to
    pub scope: NodeId,
}

impl LambdaReturnHint {
    /// Build a hint for `label`
    pub fn new(label: &str, anchor_offset: usize, scope: NodeId) -> Self {
        Self {
            display_text: format!("{HINT_PREFIX}{label}"),
            anchor_offset,
            scope,
        }
    }

    /// Label without the prefix
    pub fn label(&self) -> &str {
        self.display_text
            .strip_prefix(HINT_PREFIX)
            .unwrap_or(&self.display_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_text() {
        let hint = LambdaReturnHint::new("map", 12, NodeId::from_raw(4));
        assert_eq!(hint.display_text, "^map");
        assert_eq!(hint.label(), "map");
        let json = serde_json::to_value(&hint).unwrap();
        assert_eq!(json["display_text"], "^map");
        assert_eq!(json["anchor_offset"], 12);
    }
}
