use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use indoc::indoc;
use saphyr_schema::{
    Diagnostic, Error, ErrorCode, Loaded, Node, Options, compose, load, load_file,
    load_from_reader, options,
};

#[test]
fn root_field_is_inferred_from_the_type() {
    assert_eq!(load::<bool>("on", Options::default()).unwrap(), Loaded::Success(true));
    assert_eq!(load::<usize>("12", Options::default()).unwrap(), Loaded::Success(12));
    assert_eq!(load::<f32>("1.5", Options::default()).unwrap(), Loaded::Success(1.5));
    assert_eq!(
        load::<BTreeMap<String, Vec<String>>>("a: [x]\nb: []\n", Options::default()).unwrap(),
        Loaded::Success(BTreeMap::from([
            ("a".to_owned(), vec!["x".to_owned()]),
            ("b".to_owned(), vec![]),
        ]))
    );
}

#[test]
fn error_handler_receives_node_and_diagnostic() {
    let calls: Rc<RefCell<Vec<(String, Diagnostic)>>> = Rc::default();
    let record = Rc::clone(&calls);
    let options = Options::default().with_error_handler(move |node: &Node, diagnostic: &Diagnostic| {
        record
            .borrow_mut()
            .push((node.kind().to_string(), diagnostic.clone()));
    });

    assert_eq!(load::<String>("[a, list]", options).unwrap(), Loaded::Failed);
    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "sequence");
    assert_eq!(calls[0].1.code, ErrorCode::UnexpectedNodeType);
}

#[test]
fn fail_fast_error_carries_a_snippet() {
    let yaml = indoc! {"
        - 1
        - 2
        - three
    "};
    let err = load::<Vec<u8>>(yaml, Options::default()).unwrap_err();
    assert!(matches!(err, Error::WithSnippet { .. }));
    let rendered = err.to_string();
    assert!(rendered.contains("VALUE_ERROR"), "{rendered}");
    assert!(rendered.contains("- three"), "{rendered}");
    assert!(rendered.contains("<input>"), "{rendered}");
    assert_eq!(err.location().map(|l| (l.line(), l.column())), Some((3, 3)));
}

#[test]
fn snippets_can_be_turned_off() {
    let options = options! { with_snippet: false };
    let err = load::<u8>("300", options).unwrap_err();
    assert!(matches!(err, Error::Load { .. }));
    assert_eq!(err.to_string(), "VALUE_ERROR: `300` is not a valid u8 at line 1, column 1");
}

#[test]
fn parse_errors_are_returned_even_when_collecting() {
    let options = Options::default().with_error_handler(|_: &Node, _: &Diagnostic| {
        panic!("parse errors do not go through the handler");
    });
    let err = load::<Vec<u8>>("[1, 2", options).unwrap_err();
    assert_eq!(err.code(), None);
    assert!(err.location().is_some());
}

#[test]
fn empty_and_multi_document_sources_are_rejected() {
    let empty = load::<String>("", Options::default()).unwrap_err();
    assert!(matches!(empty.without_snippet(), Error::Eof { .. }));

    let multi = load::<String>("a\n---\nb\n", Options::default()).unwrap_err();
    assert!(matches!(multi.without_snippet(), Error::MultipleDocuments { .. }));
}

#[test]
fn anchors_and_aliases() {
    let yaml = indoc! {"
        base: &ports [80, 443]
        copy: *ports
    "};
    let loaded = load::<BTreeMap<String, Vec<u16>>>(yaml, Options::default()).unwrap();
    let Loaded::Success(map) = loaded else {
        panic!("expected a value");
    };
    assert_eq!(map["base"], map["copy"]);

    let root = compose(yaml).unwrap();
    let pairs = root.as_mapping().unwrap();
    assert!(Rc::ptr_eq(&pairs[0].1, &pairs[1].1));
}

#[test]
fn reader_input_with_bom() {
    let bytes: &[u8] = b"\xEF\xBB\xBF[1, 2, 3]\n";
    assert_eq!(
        load_from_reader::<Vec<i32>, _>(bytes, Options::default()).unwrap(),
        Loaded::Success(vec![1, 2, 3])
    );
}

#[test]
fn file_location_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.yaml");
    std::fs::write(&path, "alpha: 1\nbeta: nope\n").unwrap();

    let err = load_file::<BTreeMap<String, u8>>(&path, Options::default()).unwrap_err();
    let location = path.to_string_lossy().into_owned();
    assert_eq!(err.document(), Some(location.as_str()));
    assert!(err.to_string().contains("settings.yaml"));

    let seen: Rc<RefCell<Vec<Diagnostic>>> = Rc::default();
    let record = Rc::clone(&seen);
    let options = Options::default().with_error_handler(move |_: &Node, d: &Diagnostic| {
        record.borrow_mut().push(d.clone())
    });
    let loaded = load_file::<BTreeMap<String, u8>>(&path, options).unwrap();
    assert_eq!(loaded, Loaded::Success(BTreeMap::from([("alpha".to_owned(), 1)])));
    let seen = seen.borrow();
    assert_eq!(seen[0].document.as_deref(), Some(location.as_str()));
    assert_eq!(seen[0].location.line(), 2);
}

#[test]
fn parse_error_in_a_file_gets_a_snippet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "alpha: 1\nbeta: @oops\ngamma: 3\n").unwrap();

    let err = load_file::<BTreeMap<String, u8>>(&path, Options::default()).unwrap_err();
    assert!(matches!(err, Error::WithSnippet { .. }));
    let rendered = err.to_string();
    assert!(rendered.contains("broken.yaml"), "{rendered}");
    assert!(rendered.contains("beta: @oops"), "{rendered}");
    assert_eq!(err.code(), None);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_file::<String>(dir.path().join("absent.yaml"), Options::default()).unwrap_err();
    assert!(matches!(err, Error::IOError { .. }));
}

#[test]
fn diagnostics_serialize_for_reports() {
    let diagnostics = saphyr_schema::Diagnostics::new();
    let options = options! { error_handler: Some(diagnostics.handler()) };
    let _ = load::<Vec<bool>>("[yes, perhaps]", options).unwrap();
    let json = serde_json::to_value(diagnostics.to_vec()).unwrap();
    assert_eq!(json[0]["code"], "VALUE_ERROR");
    assert_eq!(json[0]["location"]["line"], 1);
    assert_eq!(json[0]["location"]["column"], 7);
}
