//! Coordinate conversion between editor positions and tree positions.
//!
//! Editor positions are 0-based line/character pairs, exactly what arrives at
//! the query boundary. The tree producer reports 1-based lines and columns,
//! with end columns inclusive (the column of the last character). Every `+1`
//! and `-1` between the two systems lives in this module; no other module is
//! allowed to do that arithmetic.

use serde::{Deserialize, Serialize};

/// 0-based position as used at the query boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EditorPosition {
    pub line: u32,
    pub character: u32,
}

impl EditorPosition {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// 1-based position as reported by the tree producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePosition {
    pub line: i32,
    pub column: i32,
}

/// 1-based node span. End line/column address the last character of the node
/// (inclusive). Any non-positive component marks the node as synthetic: the
/// producer generated it without a real source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSpan {
    pub start_line: i32,
    pub start_column: i32,
    pub end_line: i32,
    pub end_column: i32,
}

/// Editor-coordinate range with an inclusive end (the last contained position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: EditorPosition,
    pub end: EditorPosition,
}

impl TreeSpan {
    pub const SYNTHETIC: TreeSpan = TreeSpan {
        start_line: -1,
        start_column: -1,
        end_line: -1,
        end_column: -1,
    };

    pub fn new(start_line: i32, start_column: i32, end_line: i32, end_column: i32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A span is only queryable when every component is positive.
    pub fn is_valid(&self) -> bool {
        self.start_line > 0 && self.start_column > 0 && self.end_line > 0 && self.end_column > 0
    }
}

pub fn to_tree(pos: EditorPosition) -> TreePosition {
    TreePosition {
        line: pos.line as i32 + 1,
        column: pos.character as i32 + 1,
    }
}

pub fn to_editor(pos: TreePosition) -> EditorPosition {
    EditorPosition {
        line: (pos.line - 1).max(0) as u32,
        character: (pos.column - 1).max(0) as u32,
    }
}

/// Build a producer span from the 0-based start and exclusive 0-based end the
/// external parser reports. The resulting span stores the inclusive end
/// column in tree coordinates.
pub fn tree_span_from_editor(start: EditorPosition, end_exclusive: EditorPosition) -> TreeSpan {
    let s = to_tree(start);
    let e = to_tree(end_exclusive);
    TreeSpan {
        start_line: s.line,
        start_column: s.column,
        end_line: e.line,
        // The exclusive editor end converted to tree coordinates is one past
        // the last character, so the inclusive tree end is one back.
        end_column: e.column - 1,
    }
}

/// Inclusive containment test against a producer span.
///
/// Single-line spans contain every position between the converted start and
/// end columns, both ends included. Multi-line spans require the position to
/// sit at or after the start column on the first line, at or before the end
/// column on the last line, and contain interior lines unconditionally.
/// Synthetic spans never match.
pub fn contains_position(span: &TreeSpan, pos: EditorPosition) -> bool {
    if !span.is_valid() {
        return false;
    }
    let start = to_editor(TreePosition {
        line: span.start_line,
        column: span.start_column,
    });
    let end = to_editor(TreePosition {
        line: span.end_line,
        column: span.end_column,
    });

    if pos.line < start.line || pos.line > end.line {
        return false;
    }
    if start.line == end.line {
        return pos.character >= start.character && pos.character <= end.character;
    }
    if pos.line == start.line {
        return pos.character >= start.character;
    }
    if pos.line == end.line {
        return pos.character <= end.character;
    }
    true
}

/// Editor range of a span, or `None` for synthetic spans.
pub fn range_of(span: &TreeSpan) -> Option<Range> {
    if !span.is_valid() {
        return None;
    }
    Some(Range {
        start: to_editor(TreePosition {
            line: span.start_line,
            column: span.start_column,
        }),
        end: to_editor(TreePosition {
            line: span.end_line,
            column: span.end_column,
        }),
    })
}

/// Span measure used to pick the smallest enclosing node. The line term is
/// widened to i64 before applying the column weight; a 32-bit multiply here
/// silently wraps on large files and makes whole-class spans compare smaller
/// than single tokens.
pub fn span_measure(span: &TreeSpan) -> i64 {
    const COLUMN_WEIGHT: i64 = 1_000;
    let lines = (span.end_line - span.start_line) as i64;
    let columns = (span.end_column - span.start_column) as i64;
    lines * COLUMN_WEIGHT + columns
}
