//! Integration tests for the jottree tree builder

use std::cell::RefCell;
use std::rc::Rc;

use jottree_core::ast::{Alignment, Doc, ListKind};
use jottree_core::{
    get_string_content, parse, Block, Context, Event, Inline, ParseErrorKind, ParseOptions,
    Parser, TreeBuilder,
};

type Warnings = Rc<RefCell<Vec<(String, usize)>>>;

fn ev(annot: &'static str, startpos: usize, endpos: usize) -> Event<'static> {
    Event::new(annot, startpos, endpos)
}

fn collecting_options() -> (ParseOptions, Warnings) {
    let seen: Warnings = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let options = ParseOptions::new().with_warn(move |message, pos| {
        sink.borrow_mut().push((message.to_string(), pos));
    });
    (options, seen)
}

fn build<'a>(input: &'a str, events: Vec<Event<'static>>) -> (Doc<'a>, Vec<(String, usize)>) {
    let (options, seen) = collecting_options();
    let doc = parse(input, events, options).unwrap();
    let warnings = seen.borrow().clone();
    (doc, warnings)
}

fn only_para<'d, 'a>(doc: &'d Doc<'a>) -> &'d [Inline<'a>] {
    assert_eq!(doc.children.len(), 1, "expected a single block");
    match &doc.children[0] {
        Block::Para(p) => &p.children,
        other => panic!("expected paragraph, got {:?}", other),
    }
}

// ============================================================================
// Paragraph and Inline Tests
// ============================================================================

#[test]
fn test_paragraph_with_text() {
    let (doc, warnings) = build("hello", vec![ev("+para", 0, 0), ev("str", 0, 4), ev("-para", 5, 5)]);
    let inlines = only_para(&doc);
    assert_eq!(inlines.len(), 1);
    assert_eq!(inlines[0].text(), Some("hello"));
    assert!(warnings.is_empty());
    assert!(doc.references.is_empty());
    assert!(doc.footnotes.is_empty());
}

#[test]
fn test_nested_emphasis() {
    let input = "_a *b*_";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+emph", 0, 0),
            ev("str", 1, 2),
            ev("+strong", 3, 3),
            ev("str", 4, 4),
            ev("-strong", 5, 5),
            ev("-emph", 6, 6),
            ev("-para", 7, 7),
        ],
    );
    let inlines = only_para(&doc);
    let Inline::Emph(emph) = &inlines[0] else {
        panic!("expected emphasis");
    };
    assert_eq!(emph.children.len(), 2);
    assert_eq!(emph.children[0].text(), Some("a "));
    if let Inline::Strong(strong) = &emph.children[1] {
        assert_eq!(strong.children[0].text(), Some("b"));
    } else {
        panic!("expected strong");
    }
    assert_eq!(get_string_content(&inlines[0]), "a b");
}

#[test]
fn test_span_mark_insert_delete() {
    let input = "abcd";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+span", 0, 0),
            ev("str", 0, 0),
            ev("-span", 0, 0),
            ev("+mark", 1, 1),
            ev("str", 1, 1),
            ev("-mark", 1, 1),
            ev("+insert", 2, 2),
            ev("str", 2, 2),
            ev("-insert", 2, 2),
            ev("+delete", 3, 3),
            ev("str", 3, 3),
            ev("-delete", 3, 3),
            ev("-para", 4, 4),
        ],
    );
    let inlines = only_para(&doc);
    assert!(matches!(inlines[0], Inline::Span(_)));
    assert!(matches!(inlines[1], Inline::Mark(_)));
    assert!(matches!(inlines[2], Inline::Insert(_)));
    assert!(matches!(inlines[3], Inline::Delete(_)));
}

#[test]
fn test_quotes() {
    let input = "\"it's\"";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+double_quoted", 0, 0),
            ev("str", 1, 2),
            ev("right_single_quote", 3, 3),
            ev("str", 4, 4),
            ev("-double_quoted", 5, 5),
            ev("-para", 6, 6),
        ],
    );
    let inlines = only_para(&doc);
    let Inline::DoubleQuoted(quoted) = &inlines[0] else {
        panic!("expected double quoted");
    };
    assert!(matches!(quoted.children[1], Inline::RightSingleQuote(_)));
    assert_eq!(get_string_content(&inlines[0]), "it's");
}

#[test]
fn test_soft_and_hard_breaks() {
    let input = "a\nb\\\nc";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("str", 0, 0),
            ev("softbreak", 1, 1),
            ev("str", 2, 2),
            ev("hardbreak", 3, 4),
            ev("str", 5, 5),
            ev("-para", 6, 6),
        ],
    );
    let inlines = only_para(&doc);
    assert_eq!(inlines.len(), 5);
    assert!(matches!(inlines[1], Inline::SoftBreak(_)));
    assert!(matches!(inlines[3], Inline::HardBreak(_)));
}

#[test]
fn test_emoji_alias() {
    let input = ":smile:";
    let (doc, _) = build(input, vec![ev("+para", 0, 0), ev("emoji", 0, 6), ev("-para", 7, 7)]);
    let inlines = only_para(&doc);
    if let Inline::Emoji(emoji) = &inlines[0] {
        assert_eq!(emoji.alias, "smile");
    } else {
        panic!("expected emoji");
    }
}

#[test]
fn test_comment_is_ignored() {
    let input = "a{% note %}";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("str", 0, 0),
            ev("comment", 1, 10),
            ev("-para", 11, 11),
        ],
    );
    assert_eq!(only_para(&doc).len(), 1);
}

// ============================================================================
// Block Tests
// ============================================================================

#[test]
fn test_heading_level_from_marker_width() {
    let input = "## Title";
    let (doc, _) = build(input, vec![ev("+heading", 0, 1), ev("str", 3, 7), ev("-heading", 8, 8)]);
    let Block::Heading(heading) = &doc.children[0] else {
        panic!("expected heading");
    };
    assert_eq!(heading.level, 2);
    assert_eq!(heading.children[0].text(), Some("Title"));
}

#[test]
fn test_thematic_break_and_blockquote() {
    let input = "***\n> q";
    let (doc, _) = build(
        input,
        vec![
            ev("thematic_break", 0, 2),
            ev("+blockquote", 4, 4),
            ev("+para", 6, 6),
            ev("str", 6, 6),
            ev("-para", 7, 7),
            ev("-blockquote", 7, 7),
        ],
    );
    assert_eq!(doc.children.len(), 2);
    assert!(matches!(doc.children[0], Block::ThematicBreak(_)));
    let Block::BlockQuote(quote) = &doc.children[1] else {
        panic!("expected block quote");
    };
    assert!(matches!(quote.children[0], Block::Para(_)));
}

#[test]
fn test_loose_inlines_in_block_container_become_paragraph() {
    let input = "::: x\nab\n:::";
    let (doc, warnings) = build(
        input,
        vec![
            ev("+div", 0, 2),
            ev("str", 6, 6),
            ev("str", 7, 7),
            ev("-div", 9, 11),
        ],
    );
    let Block::Div(div) = &doc.children[0] else {
        panic!("expected div");
    };
    assert_eq!(div.children.len(), 1);
    if let Block::Para(para) = &div.children[0] {
        assert_eq!(para.children.len(), 2);
    } else {
        panic!("expected wrapped paragraph");
    }
    assert!(warnings.is_empty());
}

#[test]
fn test_block_inside_paragraph_is_dropped_with_warning() {
    let input = "abc";
    let (doc, warnings) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("str", 0, 0),
            ev("thematic_break", 1, 1),
            ev("-para", 3, 3),
        ],
    );
    assert_eq!(only_para(&doc).len(), 1);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].0.contains("block"));
}

// ============================================================================
// Attribute Tests
// ============================================================================

#[test]
fn test_class_attributes_accumulate() {
    let input = "[x]{.a}{.b}";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+span", 0, 0),
            ev("str", 1, 1),
            ev("-span", 2, 2),
            ev("+attributes", 3, 3),
            ev("class", 5, 5),
            ev("-attributes", 6, 6),
            ev("+attributes", 7, 7),
            ev("class", 9, 9),
            ev("-attributes", 10, 10),
            ev("-para", 11, 11),
        ],
    );
    let span = &only_para(&doc)[0];
    assert_eq!(span.attributes().get("class"), Some("a b"));
}

#[test]
fn test_repeated_class_is_not_deduplicated() {
    let input = "[x]{.a}{.a}";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+span", 0, 0),
            ev("str", 1, 1),
            ev("-span", 2, 2),
            ev("+attributes", 3, 3),
            ev("class", 5, 5),
            ev("-attributes", 6, 6),
            ev("+attributes", 7, 7),
            ev("class", 9, 9),
            ev("-attributes", 10, 10),
            ev("-para", 11, 11),
        ],
    );
    assert_eq!(only_para(&doc)[0].attributes().get("class"), Some("a a"));
}

#[test]
fn test_non_class_attribute_last_write_wins() {
    let input = "[x]{k=1}{k=2}";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+span", 0, 0),
            ev("str", 1, 1),
            ev("-span", 2, 2),
            ev("+attributes", 3, 3),
            ev("key", 4, 4),
            ev("value", 6, 6),
            ev("-attributes", 7, 7),
            ev("+attributes", 8, 8),
            ev("key", 9, 9),
            ev("value", 11, 11),
            ev("-attributes", 12, 12),
            ev("-para", 13, 13),
        ],
    );
    let attrs = only_para(&doc)[0].attributes();
    assert_eq!(attrs.get("k"), Some("2"));
    assert_eq!(attrs.len(), 1);
}

#[test]
fn test_split_value_is_concatenated() {
    let input = "[x]{k=\"ab\" #top}";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+span", 0, 0),
            ev("str", 1, 1),
            ev("-span", 2, 2),
            ev("+attributes", 3, 3),
            ev("key", 4, 4),
            ev("value", 7, 7),
            ev("value", 8, 8),
            ev("id", 12, 14),
            ev("-attributes", 15, 15),
            ev("-para", 16, 16),
        ],
    );
    let attrs = only_para(&doc)[0].attributes();
    assert_eq!(attrs.get("k"), Some("ab"));
    assert_eq!(attrs.get("id"), Some("top"));
}

#[test]
fn test_attributes_before_content_apply_to_container() {
    let input = "{.c}x";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+attributes", 0, 0),
            ev("class", 2, 2),
            ev("-attributes", 3, 3),
            ev("str", 4, 4),
            ev("-para", 5, 5),
        ],
    );
    assert_eq!(doc.children[0].attributes().get("class"), Some("c"));
}

// ============================================================================
// Verbatim and Link Tests
// ============================================================================

#[test]
fn test_verbatim_buffers_escapes() {
    let input = "`ab\\c`";
    let mut builder = TreeBuilder::new(input, |_: &str, _: usize| {});
    builder.handle_event(&ev("+para", 0, 0)).unwrap();
    builder.handle_event(&ev("+verbatim", 0, 0)).unwrap();
    assert_eq!(builder.context(), Context::Verbatim);
    builder.handle_event(&ev("str", 1, 2)).unwrap();
    builder.handle_event(&ev("escape", 3, 3)).unwrap();
    builder.handle_event(&ev("str", 4, 4)).unwrap();
    assert_eq!(builder.buffered_text(), "ab\\c");
    builder.handle_event(&ev("-verbatim", 5, 5)).unwrap();
    assert_eq!(builder.context(), Context::Normal);
    assert_eq!(builder.buffered_text(), "");
    builder.handle_event(&ev("-para", 6, 6)).unwrap();

    let doc = builder.finish().unwrap();
    let inlines = only_para(&doc);
    assert_eq!(inlines.len(), 1);
    if let Inline::Verbatim(verbatim) = &inlines[0] {
        assert_eq!(verbatim.text, "ab\\c");
    } else {
        panic!("expected verbatim");
    }
}

#[test]
fn test_link_construction_resets_context() {
    let input = "[docs](a\nb)";
    let mut builder = TreeBuilder::new(input, |_: &str, _: usize| {});
    for event in [
        ev("+para", 0, 0),
        ev("+linktext", 0, 0),
        ev("str", 1, 4),
        ev("-linktext", 5, 5),
    ] {
        builder.handle_event(&event).unwrap();
    }
    assert!(builder.has_pending_link());

    for event in [
        ev("+destination", 6, 6),
        ev("str", 7, 7),
        ev("softbreak", 8, 8),
        ev("str", 9, 9),
        ev("-destination", 10, 10),
    ] {
        builder.handle_event(&event).unwrap();
    }
    assert_eq!(builder.context(), Context::Normal);
    assert_eq!(builder.buffered_text(), "");
    assert!(!builder.has_pending_link());

    builder.handle_event(&ev("-para", 11, 11)).unwrap();
    let doc = builder.finish().unwrap();
    let Inline::Link(link) = &only_para(&doc)[0] else {
        panic!("expected link");
    };
    assert_eq!(link.destination, "a\nb");
    assert_eq!(link.children[0].text(), Some("docs"));
}

#[test]
fn test_destination_ignores_escapes() {
    let input = "[x](a\\_b)";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+linktext", 0, 0),
            ev("str", 1, 1),
            ev("-linktext", 2, 2),
            ev("+destination", 3, 3),
            ev("str", 4, 4),
            ev("escape", 5, 5),
            ev("str", 6, 7),
            ev("-destination", 8, 8),
            ev("-para", 9, 9),
        ],
    );
    let Inline::Link(link) = &only_para(&doc)[0] else {
        panic!("expected link");
    };
    assert_eq!(link.destination, "a_b");
}

#[test]
fn test_image_construction() {
    let input = "![alt](a.png)";
    let (doc, _) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+imagetext", 0, 1),
            ev("str", 2, 4),
            ev("-imagetext", 5, 5),
            ev("+destination", 6, 6),
            ev("str", 7, 11),
            ev("-destination", 12, 12),
            ev("-para", 13, 13),
        ],
    );
    let Inline::Image(image) = &only_para(&doc)[0] else {
        panic!("expected image");
    };
    assert_eq!(image.destination, "a.png");
    assert_eq!(get_string_content(&only_para(&doc)[0]), "alt");
}

#[test]
fn test_unmatched_destination_is_an_error() {
    let input = "(a)";
    let events = vec![
        ev("+para", 0, 0),
        ev("+destination", 0, 0),
        ev("str", 1, 1),
        ev("-destination", 2, 2),
    ];
    let err = parse(input, events, ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnmatchedDestination);
}

#[test]
fn test_replaced_link_text_warns() {
    let input = "[a][b](c)";
    let (doc, warnings) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("+linktext", 0, 0),
            ev("str", 1, 1),
            ev("-linktext", 2, 2),
            ev("+linktext", 3, 3),
            ev("str", 4, 4),
            ev("-linktext", 5, 5),
            ev("+destination", 6, 6),
            ev("str", 7, 7),
            ev("-destination", 8, 8),
            ev("-para", 9, 9),
        ],
    );
    let inlines = only_para(&doc);
    assert_eq!(inlines.len(), 1);
    assert_eq!(get_string_content(&inlines[0]), "b");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].1, 0);
}

// ============================================================================
// List Tests
// ============================================================================

fn bullet_items(input: &'static str, second_marker: (usize, usize)) -> Vec<Event<'static>> {
    let (m, text) = second_marker;
    vec![
        ev("+list_item", 0, 0),
        ev("+para", 2, 2),
        ev("str", 2, 2),
        ev("-para", 3, 3),
        ev("-list_item", 3, 3),
        ev("+list_item", m, m),
        ev("+para", text, text),
        ev("str", text, text),
        ev("-para", input.len(), input.len()),
        ev("-list_item", input.len(), input.len()),
    ]
}

#[test]
fn test_bullet_list_is_tight() {
    let input = "- a\n- b";
    let (doc, warnings) = build(input, bullet_items(input, (4, 6)));
    assert_eq!(doc.children.len(), 1);
    let Block::List(list) = &doc.children[0] else {
        panic!("expected list");
    };
    assert_eq!(list.kind, ListKind::Bullet);
    assert_eq!(list.style, "-");
    assert!(list.tight);
    assert_eq!(list.children.len(), 2);
    assert!(warnings.is_empty());
}

#[test]
fn test_marker_change_starts_new_list() {
    let input = "- a\n* b";
    let (doc, _) = build(input, bullet_items(input, (4, 6)));
    assert_eq!(doc.children.len(), 2);
    for block in &doc.children {
        if let Block::List(list) = block {
            assert_eq!(list.children.len(), 1);
        } else {
            panic!("expected list");
        }
    }
}

#[test]
fn test_blank_line_between_items_makes_list_loose() {
    let input = "- a\n\n- b";
    let events = vec![
        ev("+list_item", 0, 0),
        ev("+para", 2, 2),
        ev("str", 2, 2),
        ev("-para", 3, 3),
        ev("blankline", 4, 4),
        ev("-list_item", 4, 4),
        ev("+list_item", 5, 5),
        ev("+para", 7, 7),
        ev("str", 7, 7),
        ev("-para", 8, 8),
        ev("-list_item", 8, 8),
    ];
    let (doc, _) = build(input, events);
    let Block::List(list) = &doc.children[0] else {
        panic!("expected list");
    };
    assert_eq!(list.children.len(), 2);
    assert!(!list.tight);
}

#[test]
fn test_ordered_list_start() {
    let input = "3. a\n4. b";
    let events = vec![
        ev("+list_item", 0, 1),
        ev("+para", 3, 3),
        ev("str", 3, 3),
        ev("-para", 4, 4),
        ev("-list_item", 4, 4),
        ev("+list_item", 5, 6),
        ev("+para", 8, 8),
        ev("str", 8, 8),
        ev("-para", 9, 9),
        ev("-list_item", 9, 9),
    ];
    let (doc, _) = build(input, events);
    let Block::List(list) = &doc.children[0] else {
        panic!("expected list");
    };
    assert_eq!(list.kind, ListKind::Ordered);
    assert_eq!(list.style, "1.");
    assert_eq!(list.start, Some(3));
    assert_eq!(list.children.len(), 2);
}

#[test]
fn test_roman_list_resolves_ambiguous_first_marker() {
    let input = "i. a\nii. b";
    let events = vec![
        ev("+list_item", 0, 1),
        ev("+para", 3, 3),
        ev("str", 3, 3),
        ev("-para", 4, 4),
        ev("-list_item", 4, 4),
        ev("+list_item", 5, 7),
        ev("+para", 9, 9),
        ev("str", 9, 9),
        ev("-para", 10, 10),
        ev("-list_item", 10, 10),
    ];
    let (doc, _) = build(input, events);
    assert_eq!(doc.children.len(), 1);
    let Block::List(list) = &doc.children[0] else {
        panic!("expected list");
    };
    assert_eq!(list.style, "i.");
    assert_eq!(list.start, Some(1));
}

#[test]
fn test_ambiguous_letters_read_as_alphabetic() {
    let input = "c. a\nd. b";
    let events = vec![
        ev("+list_item", 0, 1),
        ev("+para", 3, 3),
        ev("str", 3, 3),
        ev("-para", 4, 4),
        ev("-list_item", 4, 4),
        ev("+list_item", 5, 6),
        ev("+para", 8, 8),
        ev("str", 8, 8),
        ev("-para", 9, 9),
        ev("-list_item", 9, 9),
    ];
    let (doc, _) = build(input, events);
    let Block::List(list) = &doc.children[0] else {
        panic!("expected list");
    };
    assert_eq!(list.style, "a.");
    assert_eq!(list.start, Some(3));
}

#[test]
fn test_task_list() {
    let input = "- [x] a";
    let events = vec![
        ev("+list_item", 0, 0),
        ev("checkbox_checked", 2, 4),
        ev("+para", 6, 6),
        ev("str", 6, 6),
        ev("-para", 7, 7),
        ev("-list_item", 7, 7),
    ];
    let (doc, _) = build(input, events);
    let Block::List(list) = &doc.children[0] else {
        panic!("expected list");
    };
    assert_eq!(list.kind, ListKind::Task);
    assert_eq!(list.children[0].checkbox, Some(true));
}

#[test]
fn test_checkbox_outside_item_warns() {
    let input = "[ ] a";
    let (doc, warnings) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("checkbox_unchecked", 0, 2),
            ev("str", 4, 4),
            ev("-para", 5, 5),
        ],
    );
    assert_eq!(only_para(&doc).len(), 1);
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_paragraph_after_list_ends_it() {
    let input = "- a\n\nb";
    let events = vec![
        ev("+list_item", 0, 0),
        ev("+para", 2, 2),
        ev("str", 2, 2),
        ev("-para", 3, 3),
        ev("-list_item", 3, 3),
        ev("blankline", 4, 4),
        ev("+para", 5, 5),
        ev("str", 5, 5),
        ev("-para", 6, 6),
    ];
    let (doc, _) = build(input, events);
    assert_eq!(doc.children.len(), 2);
    assert!(matches!(doc.children[0], Block::List(_)));
    assert!(matches!(doc.children[1], Block::Para(_)));
}

#[test]
fn test_nested_list() {
    let input = "- a\n  - b";
    let events = vec![
        ev("+list_item", 0, 0),
        ev("+para", 2, 2),
        ev("str", 2, 2),
        ev("-para", 3, 3),
        ev("+list_item", 6, 6),
        ev("+para", 8, 8),
        ev("str", 8, 8),
        ev("-para", 9, 9),
        ev("-list_item", 9, 9),
        ev("-list_item", 9, 9),
    ];
    let (doc, warnings) = build(input, events);
    assert!(warnings.is_empty());
    assert_eq!(doc.children.len(), 1);
    let Block::List(outer) = &doc.children[0] else {
        panic!("expected list");
    };
    assert_eq!(outer.children.len(), 1);
    let item = &outer.children[0];
    assert_eq!(item.children.len(), 2);
    if let Block::List(inner) = &item.children[1] {
        assert_eq!(inner.children.len(), 1);
    } else {
        panic!("expected nested list");
    }
}

// ============================================================================
// Table Tests
// ============================================================================

fn table_events() -> Vec<Event<'static>> {
    vec![
        ev("+table", 0, 0),
        ev("+row", 0, 0),
        ev("+cell", 0, 0),
        ev("str", 1, 1),
        ev("-cell", 2, 2),
        ev("+cell", 2, 2),
        ev("str", 3, 3),
        ev("-cell", 4, 4),
        ev("-row", 4, 4),
        ev("+row", 6, 6),
        ev("separator_left", 7, 8),
        ev("separator_right", 10, 11),
        ev("-row", 12, 12),
        ev("+row", 14, 14),
        ev("+cell", 14, 14),
        ev("str", 15, 15),
        ev("-cell", 16, 16),
        ev("+cell", 16, 16),
        ev("str", 17, 17),
        ev("-cell", 18, 18),
        ev("-row", 18, 18),
    ]
}

#[test]
fn test_table_header_and_alignment() {
    let input = "|a|b|\n|:-|-:|\n|c|d|";
    let mut events = table_events();
    events.push(ev("-table", 18, 18));
    let (doc, warnings) = build(input, events);
    assert!(warnings.is_empty());

    let Block::Table(table) = &doc.children[0] else {
        panic!("expected table");
    };
    assert!(table.caption.is_none());
    assert_eq!(table.children.len(), 2);

    let head = &table.children[0];
    assert!(head.head);
    assert!(head.children.iter().all(|cell| cell.head));
    assert_eq!(head.children[0].align, Alignment::Left);
    assert_eq!(head.children[1].align, Alignment::Right);

    let body = &table.children[1];
    assert!(!body.head);
    assert_eq!(body.children[0].align, Alignment::Left);
    assert_eq!(body.children[1].align, Alignment::Right);
    assert!(matches!(body.children[0].children[0], Block::Para(_)));
}

#[test]
fn test_table_caption() {
    let input = "|a|b|\n|:-|-:|\n|c|d|\n^ cap";
    let mut events = table_events();
    events.extend([
        ev("+caption", 20, 21),
        ev("str", 22, 24),
        ev("-caption", 25, 25),
        ev("-table", 25, 25),
    ]);
    let (doc, _) = build(input, events);
    let Block::Table(table) = &doc.children[0] else {
        panic!("expected table");
    };
    let caption = table.caption.as_ref().unwrap();
    assert_eq!(caption.children[0].text(), Some("cap"));
    assert_eq!(table.children.len(), 2);
}

#[test]
fn test_separator_outside_row_warns() {
    let input = "---";
    let (doc, warnings) = build(
        input,
        vec![ev("+para", 0, 0), ev("separator_default", 0, 2), ev("-para", 3, 3)],
    );
    assert_eq!(only_para(&doc).len(), 0);
    assert_eq!(warnings.len(), 1);
}

// ============================================================================
// Error and Recovery Tests
// ============================================================================

#[test]
fn test_truncated_stream_discards_orphans() {
    let input = "a\n\n_b";
    let (doc, warnings) = build(
        input,
        vec![
            ev("+para", 0, 0),
            ev("str", 0, 0),
            ev("-para", 1, 1),
            ev("+para", 3, 3),
            ev("+emph", 3, 3),
            ev("str", 4, 4),
        ],
    );
    assert_eq!(only_para(&doc)[0].text(), Some("a"));
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|(message, pos)| message.contains("unclosed") && *pos == 3));
}

#[test]
fn test_unterminated_link_text_is_discarded() {
    let input = "[a";
    let (doc, warnings) = build(
        input,
        vec![ev("+para", 0, 0), ev("+linktext", 0, 0), ev("str", 1, 1), ev("-linktext", 2, 2)],
    );
    assert!(doc.children.is_empty());
    assert_eq!(warnings.len(), 2);
}

#[test]
fn test_unknown_event_keeps_earlier_nodes() {
    let input = "ab";
    let mut builder = TreeBuilder::new(input, |_: &str, _: usize| {});
    builder.handle_event(&ev("+para", 0, 0)).unwrap();
    builder.handle_event(&ev("str", 0, 0)).unwrap();
    builder.handle_event(&ev("-para", 1, 1)).unwrap();

    let err = builder.handle_event(&ev("+footnote", 1, 1)).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::UnknownEvent);
    assert_eq!(err.span().map(|s| s.start), Some(1));
    assert!(err.to_string().contains("+footnote"));

    let doc = builder.finish().unwrap();
    assert_eq!(only_para(&doc)[0].text(), Some("a"));
}

#[test]
fn test_invalid_span_is_an_error() {
    let err = parse("abc", vec![ev("+para", 0, 0), ev("str", 0, 10)], ParseOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::InvalidSpan);
}

#[test]
fn test_heading_span_past_usize_max_is_invalid() {
    let events = vec![ev("+heading", 0, usize::MAX), ev("str", 2, 2), ev("-heading", 3, 3)];
    let err = parse("# a", events, ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::InvalidSpan);
}

#[test]
fn test_heading_span_outside_input_is_invalid() {
    let events = vec![ev("+heading", usize::MAX - 1, usize::MAX - 1)];
    let err = parse("# a", events, ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::InvalidSpan);
}

#[test]
fn test_close_without_open_underflows() {
    let err = parse("x", vec![ev("-para", 0, 0)], ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ParseErrorKind::StackUnderflow);
}

#[test]
fn test_default_warning_sink() {
    let doc = parse("_x", vec![ev("+emph", 0, 0), ev("str", 1, 1)], ParseOptions::default())
        .unwrap();
    assert!(doc.children.is_empty());
}

#[test]
fn test_parser_is_reusable() {
    let mut parser = Parser::new(ParseOptions::new().with_source_positions(true));
    assert!(parser.options().source_positions);
    for input in ["one", "two"] {
        let doc = parser
            .parse(input, vec![ev("+para", 0, 0), ev("str", 0, 2), ev("-para", 3, 3)])
            .unwrap();
        assert_eq!(only_para(&doc)[0].text(), Some(input));
    }
}

#[test]
fn test_well_formed_stream_has_no_warnings() {
    let input = "# T\n\n> q";
    let (doc, warnings) = build(
        input,
        vec![
            ev("+heading", 0, 0),
            ev("str", 2, 2),
            ev("-heading", 3, 3),
            ev("blankline", 4, 4),
            ev("+blockquote", 5, 5),
            ev("+para", 7, 7),
            ev("str", 7, 7),
            ev("-para", 8, 8),
            ev("-blockquote", 8, 8),
        ],
    );
    assert_eq!(doc.children.len(), 2);
    assert!(warnings.is_empty());
}
