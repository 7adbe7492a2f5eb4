use std::cell::RefCell;
use std::collections::HashSet;

use pretty_assertions::assert_eq;
use tagup::{
    DirectoryStore, ErrorKind, FetchError, Globals, MemoryStore, Node, NullStore, Renderer,
    TagStore, TagupError,
};

fn tags() -> MemoryStore {
    MemoryStore::with_tags([
        ("const", "constant value"),
        ("positional-sub", r"<sub>[\\1]</sub>"),
        ("named-sub", r"<sub>[\\arg]</sub>"),
        ("sub", r"<s>[\\1]</s>"),
        ("t", r"[\if 1\yes\no]"),
        ("list", r"<ul>[\loop\<li>[\item]</li>\<empty/>]</ul>"),
        ("greeting", r"[\\salutation], [\\1]"),
        ("nested-greeting", r"[greeting [\\1]]"),
        ("shadowing", r"[greeting salutation\\Hi\[\\1]]"),
    ])
}

fn render(markup: &str) -> String {
    Renderer::new(tags()).render(markup, None).unwrap()
}

fn render_err(markup: &str) -> TagupError {
    Renderer::new(tags()).render(markup, None).unwrap_err()
}

#[test]
fn test_plain_text() {
    assert_eq!(render("plain text"), "plain text");
    assert_eq!(render("\nplain\n\ntext\n"), "\nplain\n\ntext\n");
}

#[test]
fn test_escape_sequences() {
    assert_eq!(render(r"[\o]"), "[");
    assert_eq!(render(r"[\c]"), "]");
    assert_eq!(render(r"[\s]"), "\\");
}

#[test]
fn test_constant_tag() {
    assert_eq!(render("[const]"), "constant value");
    assert_eq!(render("<outer>\n[const]</outer>"), "<outer>\nconstant value</outer>");
}

#[test]
fn test_positional_substitution() {
    assert_eq!(render(r"[positional-sub\argument value]"), "<sub>argument value</sub>");
    assert_eq!(render("[positional-sub argument value]"), "<sub>argument value</sub>");
    assert_eq!(
        render("[positional-sub\n\\\nargument value\n]"),
        "<sub>\nargument value\n</sub>"
    );
    assert_eq!(
        render("[positional-sub\nargument value\n]"),
        "<sub>argument value\n</sub>"
    );
}

#[test]
fn test_named_substitution() {
    assert_eq!(render(r"[named-sub\arg\\argument value]"), "<sub>argument value</sub>");
    assert_eq!(render(r"[named-sub arg\\argument value]"), "<sub>argument value</sub>");
    assert_eq!(
        render("[named-sub\n\\\narg\n\\\\\nargument value\n]"),
        "<sub>\nargument value\n</sub>"
    );
    assert_eq!(
        render("[named-sub\narg\n\\\\\nargument value\n]"),
        "<sub>\nargument value\n</sub>"
    );
}

#[test]
fn test_example_scenarios() {
    assert_eq!(render(r"[sub\hello]"), "<s>hello</s>");
    assert_eq!(render("[t]"), "no");
    assert_eq!(render("[t x]"), "yes");
}

#[test]
fn test_positional_order() {
    let store = MemoryStore::with_tags([("second", r"[\\2]")]);
    let renderer = Renderer::new(store);
    assert_eq!(renderer.render(r"[second A\B\C]", None).unwrap(), "B");
}

#[test]
fn test_loop() {
    assert_eq!(
        render(r"[list a\b\c]"),
        "<ul><li>a</li><li>b</li><li>c</li></ul>"
    );
    assert_eq!(render("[list]"), "<ul><empty/></ul>");
}

#[test]
fn test_loop_item_is_not_reevaluated() {
    assert_eq!(render(r"[list [\o]const[\c]]"), "<ul><li>[const]</li></ul>");
}

#[test]
fn test_globals_visible_in_nested_expansions() {
    let mut globals = Globals::new();
    globals.insert("salutation".to_string(), "Hello".to_string());
    let renderer = Renderer::new(tags());

    assert_eq!(
        renderer.render("[nested-greeting World]", Some(&globals)).unwrap(),
        "Hello, World"
    );
    assert_eq!(
        renderer.render("[shadowing World]", Some(&globals)).unwrap(),
        "Hi, World"
    );
}

#[test]
fn test_missing_named_argument() {
    let err = render_err("text [greeting World]");
    assert_eq!(err.kind(), ErrorKind::NamedArgumentNotFound);
    assert_eq!(err.to_string(), "named argument not found: salutation");
    assert_eq!(
        err.trace().to_string(),
        r"ROOT -> 1,6 -> greeting -> 1,1 -> \\salutation"
    );
}

#[test]
fn test_missing_tag() {
    let err = render_err("[const][absent]");
    assert_eq!(err.kind(), ErrorKind::TagNotFound);
    assert_eq!(err.trace().to_string(), "ROOT -> 1,8 -> absent");
}

#[test]
fn test_recursion_overflow() {
    let renderer = Renderer::new(MemoryStore::with_tags([("r", "[r]")])).with_max_depth(3);
    let err = renderer.render("[r]", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StackOverflow);
    assert_eq!(err.trace().entries().len(), 5);
}

#[test]
fn test_depth_within_limit() {
    let store = MemoryStore::with_tags([("a", "<[b]>"), ("b", "<[c]>"), ("c", "c")]);
    let renderer = Renderer::new(store).with_max_depth(3);
    assert_eq!(renderer.render("[a]", None).unwrap(), "<<c>>");

    let store = MemoryStore::with_tags([("a", "<[b]>"), ("b", "<[c]>"), ("c", "c")]);
    let renderer = Renderer::new(store).with_max_depth(2);
    let err = renderer.render("[a]", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StackOverflow);
    assert_eq!(
        err.to_string(),
        "tag stack overflow: ROOT -> 1,1 -> a -> 1,2 -> b -> 1,2 -> c"
    );
}

#[test]
fn test_trim_args_strips_unicode_whitespace() {
    let renderer = Renderer::new(tags()).with_trim_args(true);
    assert_eq!(
        renderer.render("[named-sub arg\\\u{3000} value\u{2003}]", None).unwrap(),
        "<sub>value</sub>"
    );
    assert_eq!(
        renderer.render("[positional-sub\\\u{00a0}value\n]", None).unwrap(),
        "<sub>value</sub>"
    );
}

#[test]
fn test_renders_again_after_failure() {
    let renderer = Renderer::new(MemoryStore::with_tags([("r", "[r]"), ("ok", "fine")]))
        .with_max_depth(3);
    assert!(renderer.render("[r]", None).is_err());
    assert_eq!(renderer.render("[ok]", None).unwrap(), "fine");
}

#[test]
fn test_syntax_error() {
    let err = render_err("[\\bogus]");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    match err {
        TagupError::Syntax { error, trace } => {
            assert_eq!((error.line, error.column), (1, 1));
            assert_eq!(trace.to_string(), "ROOT");
        }
        other => panic!("Expected Syntax error, got {other:?}"),
    }
}

#[test]
fn test_unimplemented_fetch() {
    let renderer = Renderer::new(NullStore);
    let err = renderer.render("[const]", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
    assert_eq!(err.to_string(), "not implemented: get_tag");
    assert_eq!(renderer.render("no tags here", None).unwrap(), "no tags here");
}

#[derive(Default)]
struct PrefetchRecorder {
    tags: MemoryStore,
    calls: RefCell<Vec<HashSet<String>>>,
}

impl TagStore for PrefetchRecorder {
    fn get_tag(&self, name: &str) -> Result<String, FetchError> {
        self.tags.get_tag(name)
    }

    fn prefetch_tags(&self, names: &HashSet<String>) {
        self.calls.borrow_mut().push(names.clone());
    }
}

#[test]
fn test_tag_prefetching() {
    let store = PrefetchRecorder {
        tags: MemoryStore::with_tags([
            ("a", "constant value"),
            ("b", "constant value"),
            ("c", "constant value"),
        ]),
        ..Default::default()
    };
    let renderer = Renderer::new(&store);
    renderer
        .render("[a] [b] [b] [a] [c] [a] [c] [a]", None)
        .unwrap();

    let expected: HashSet<String> = ["a", "b", "c"].into_iter().map(String::from).collect();
    assert_eq!(*store.calls.borrow(), vec![expected]);
}

#[test]
fn test_prefetch_includes_nested_references() {
    let store = PrefetchRecorder::default();
    let renderer = Renderer::new(&store);
    // The fetch fails, but the prefetch happens first.
    let _ = renderer.render(r"[a [b]\k\\[c]][\if x\[d]\[e]][\loop\[f]]", None);

    let expected: HashSet<String> = ["a", "b", "c", "d", "e", "f"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(*store.calls.borrow(), vec![expected]);
}

#[test]
fn test_preprocess() {
    let renderer = Renderer::new(NullStore).with_pre_hook(|_| Node::Block(vec![Node::text("pre")]));
    assert_eq!(renderer.render("value", None).unwrap(), "pre");
}

#[test]
fn test_postprocess() {
    let renderer = Renderer::new(NullStore).with_post_hook(|s| format!("<post>{s}</post>"));
    assert_eq!(renderer.render("value", None).unwrap(), "<post>value</post>");
}

#[test]
fn test_pre_and_postprocess() {
    let renderer = Renderer::new(NullStore)
        .with_pre_hook(|_| Node::Block(vec![Node::text("pre")]))
        .with_post_hook(|s| format!("<post>{s}</post>"));
    assert_eq!(renderer.render("value", None).unwrap(), "<post>pre</post>");
}

#[test]
fn test_directory_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("page.tag"), r"<h1>[\\title]</h1>[body [\\1]]").unwrap();
    std::fs::write(dir.path().join("body.tag"), r"<p>[\\1]</p>").unwrap();

    let renderer = Renderer::new(DirectoryStore::new(dir.path()));
    assert_eq!(
        renderer.render(r"[page title\\Hi\text]", None).unwrap(),
        "<h1>Hi</h1><p>text</p>"
    );

    let err = renderer.render("[../page]", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TagNotFound);
}
