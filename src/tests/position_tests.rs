use crate::position::{
    contains_position, range_of, span_measure, to_editor, to_tree, tree_span_from_editor,
    EditorPosition, TreePosition, TreeSpan,
};

#[test]
fn editor_to_tree_is_one_based() {
    let tree = to_tree(EditorPosition::new(0, 0));
    assert_eq!(tree, TreePosition { line: 1, column: 1 });

    let tree = to_tree(EditorPosition::new(12, 7));
    assert_eq!(tree, TreePosition { line: 13, column: 8 });
}

#[test]
fn conversion_round_trips() {
    for (line, character) in [(0, 0), (1, 0), (0, 1), (99, 42)] {
        let pos = EditorPosition::new(line, character);
        assert_eq!(to_editor(to_tree(pos)), pos);
    }
}

#[test]
fn span_from_exclusive_editor_end_stores_inclusive_column() {
    // Editor span [(0,5), (0,10)) covers characters 5..=9.
    let span = tree_span_from_editor(EditorPosition::new(0, 5), EditorPosition::new(0, 10));
    assert_eq!(span, TreeSpan::new(1, 6, 1, 10));
}

#[test]
fn single_line_containment_is_inclusive_at_both_ends() {
    let span = tree_span_from_editor(EditorPosition::new(0, 5), EditorPosition::new(0, 10));
    assert!(!contains_position(&span, EditorPosition::new(0, 4)));
    assert!(contains_position(&span, EditorPosition::new(0, 5)));
    assert!(contains_position(&span, EditorPosition::new(0, 9)));
    assert!(!contains_position(&span, EditorPosition::new(0, 10)));
    assert!(!contains_position(&span, EditorPosition::new(1, 5)));
}

#[test]
fn multi_line_containment() {
    // Lines 2..=4 in editor coordinates, starting at char 8, ending at char 2.
    let span = tree_span_from_editor(EditorPosition::new(2, 8), EditorPosition::new(4, 3));

    assert!(!contains_position(&span, EditorPosition::new(2, 7)));
    assert!(contains_position(&span, EditorPosition::new(2, 8)));
    // Interior lines are contained at any character.
    assert!(contains_position(&span, EditorPosition::new(3, 0)));
    assert!(contains_position(&span, EditorPosition::new(3, 500)));
    assert!(contains_position(&span, EditorPosition::new(4, 2)));
    assert!(!contains_position(&span, EditorPosition::new(4, 3)));
    assert!(!contains_position(&span, EditorPosition::new(5, 0)));
}

#[test]
fn synthetic_spans_never_contain_anything() {
    assert!(!contains_position(
        &TreeSpan::SYNTHETIC,
        EditorPosition::new(0, 0)
    ));
    let partial = TreeSpan::new(1, 1, -1, -1);
    assert!(!contains_position(&partial, EditorPosition::new(0, 0)));
}

#[test]
fn range_of_synthetic_is_none() {
    assert!(range_of(&TreeSpan::SYNTHETIC).is_none());

    let span = TreeSpan::new(3, 5, 3, 9);
    let range = range_of(&span).unwrap();
    assert_eq!(range.start, EditorPosition::new(2, 4));
    assert_eq!(range.end, EditorPosition::new(2, 8));
}

#[test]
fn span_measure_survives_very_long_files() {
    // A whole-file span over three million lines must still compare larger
    // than a single token; a 32-bit measure would wrap negative here.
    let huge = TreeSpan::new(1, 1, 3_000_000, 2);
    let token = TreeSpan::new(2_999_999, 4, 2_999_999, 11);
    assert!(span_measure(&huge) > 0);
    assert!(span_measure(&huge) > span_measure(&token));
}
