use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use indoc::indoc;
use saphyr_schema::{
    AnyField, Diagnostics, EnvHandler, Error, ErrorCode, FailHandler, IntField, ListField, Loaded,
    LoadingContext, MemoryResolver, Options, Schema, SchemaBuilder, StringField, SwitchHandler,
    TagHandler, TagHandlers, compose, load, load_with_field,
};

fn collecting(options: Options) -> (Diagnostics, Options) {
    let diagnostics = Diagnostics::new();
    let mut options = options;
    options.error_handler = Some(diagnostics.handler());
    (diagnostics, options)
}

/// Counts how many times `!probe` nodes are loaded.
struct Probe {
    hits: Rc<RefCell<usize>>,
}

impl TagHandler for Probe {
    fn tag_pattern(&self) -> &str {
        "^probe$"
    }

    fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        *self.hits.borrow_mut() += 1;
        field.load_any(ctx)
    }
}

#[test]
fn switch_takes_the_first_candidate_that_loads() {
    let hits = Rc::new(RefCell::new(0));
    let options = Options::default()
        .with_tag_handler(FailHandler)
        .with_tag_handler(Probe { hits: Rc::clone(&hits) });
    let loaded = load::<i32>("!switch [!fail 1, 2, !probe 3]", options).unwrap();
    assert_eq!(loaded, Loaded::Success(2));
    assert_eq!(*hits.borrow(), 0, "candidates after the winner are not loaded");
}

#[test]
fn switch_with_no_winner_fails_quietly() {
    let (diagnostics, options) = collecting(Options::default().with_tag_handler(FailHandler));
    let loaded = load::<Vec<i32>>("[!switch [!fail 1, !fail 2], 3]", options).unwrap();
    assert_eq!(loaded, Loaded::Success(vec![3]));
    assert!(diagnostics.is_empty());
}

#[test]
fn switch_keeps_diagnostics_of_failed_candidates() {
    let (diagnostics, options) = collecting(Options::default());
    let loaded = load::<i32>("!switch [ten, 10]", options).unwrap();
    assert_eq!(loaded, Loaded::Success(10));
    assert_eq!(diagnostics.codes(), vec![ErrorCode::ValueError]);
}

#[test]
fn fail_at_the_root_gives_failed() {
    let (diagnostics, options) = collecting(Options::default().with_tag_handler(FailHandler));
    assert_eq!(load::<String>("!fail value", options).unwrap(), Loaded::Failed);
    assert!(diagnostics.is_empty());
}

/// Matches every tag, so it clashes with any other handler.
struct AnyTag;

impl TagHandler for AnyTag {
    fn tag_pattern(&self) -> &str {
        ".*"
    }

    fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        field.load_any(ctx)
    }
}

#[test]
fn ambiguous_tags_are_reported() {
    let (diagnostics, options) = collecting(Options::default().with_tag_handler(AnyTag));
    let loaded = load::<Vec<i32>>("[1, !switch [2], !custom 3]", options).unwrap();
    assert_eq!(loaded, Loaded::Success(vec![1, 3]));
    assert_eq!(diagnostics.codes(), vec![ErrorCode::MultipleMatchingHandlers]);
}

#[test]
fn ambiguous_tags_abort_a_fail_fast_load() {
    let err = load::<Vec<i32>>("[1, !switch [2]]", Options::default().with_tag_handler(AnyTag))
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::MultipleMatchingHandlers));
    assert_eq!(err.location().map(|l| l.line()), Some(1));

    let mut handlers = TagHandlers::new();
    handlers.register(Rc::new(SwitchHandler)).unwrap();
    handlers.register(Rc::new(AnyTag)).unwrap();
    let mut ctx = LoadingContext::fail_fast(&handlers);
    let root = compose("[1, !switch [2]]").unwrap();
    let err = ctx
        .load(&ListField::new(IntField::<i32>::new()), &root, None)
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::MultipleMatchingHandlers));
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn unknown_and_secondary_tags_go_to_the_field() {
    let loaded = load::<Vec<String>>("[!unknown a, !!str b]", Options::default()).unwrap();
    assert_eq!(loaded, Loaded::Success(vec!["a".to_owned(), "b".to_owned()]));
}

#[test]
fn env_reads_variables_through_the_lookup() {
    let env = EnvHandler::with_lookup(|name| (name == "PORT").then(|| "9000".to_owned()));
    let mut handlers = TagHandlers::new();
    handlers.register(Rc::new(env)).unwrap();
    handlers.register(Rc::new(SwitchHandler)).unwrap();

    let mut ctx = LoadingContext::fail_fast(&handlers);
    let field = IntField::<u16>::new();
    let root = compose("!env PORT").unwrap();
    assert_eq!(ctx.load(&field, &root, None).unwrap(), Loaded::Success(9000));

    let root = compose("!switch [!env HOST_PORT, 80]").unwrap();
    assert_eq!(ctx.load(&field, &root, None).unwrap(), Loaded::Success(80));

    // The variable value goes through the field like any scalar.
    let root = compose("!env PORT").unwrap();
    let err = ctx.load(&StringField::new().pattern("[a-z]+").unwrap(), &root, None).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationError));
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn registered_env_handler_replaces_the_builtin_one() {
    let (diagnostics, options) = collecting(
        Options::default()
            .with_tag_handler(EnvHandler::with_lookup(|name| (name == "PORT").then(|| "9000".into()))),
    );
    assert_eq!(load::<u16>("!env PORT", options.clone()).unwrap(), Loaded::Success(9000));
    assert_eq!(
        load::<u16>("!switch [!env HOME, 80]", options).unwrap(),
        Loaded::Success(80)
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn env_falls_back_through_switch() {
    let loaded = load::<u16>(
        "!switch [!env SAPHYR_SCHEMA_SURELY_UNSET_VARIABLE, 8080]",
        Options::default(),
    )
    .unwrap();
    assert_eq!(loaded, Loaded::Success(8080));
}

fn documents() -> MemoryResolver {
    MemoryResolver::new()
        .with("port.yaml", "8080")
        .with("server.yaml", "host: inner\nport: !include port.yaml\n")
        .with("broken.yaml", "key: [unclosed\n")
        .with("bad-port.yaml", "eighty\n")
        .with("servers/a.yaml", "host: a\n")
        .with("servers/b.yaml", "port: 1\n")
        .with("servers/c.yaml", "host: c\n")
        .with("loop.yaml", "!include loop.yaml\n")
}

#[derive(Default, Debug, PartialEq)]
struct Server {
    host: String,
    port: u16,
}

impl Schema for Server {
    fn declare(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("host", StringField::new().required(), |s, v| s.host = v)
            .field("port", IntField::new(), |s, v| s.port = v);
    }
}

#[test]
fn include_splices_the_referenced_document() {
    let options = Options::default().with_resolver(documents());
    let loaded = load::<Server>("!include server.yaml", options).unwrap();
    assert_eq!(
        loaded,
        Loaded::Success(Server {
            host: "inner".into(),
            port: 8080,
        })
    );
}

#[test]
fn import_is_an_alias_of_include() {
    let options = Options::default().with_resolver(documents());
    assert_eq!(load::<u16>("!import port.yaml", options).unwrap(), Loaded::Success(8080));
}

#[test]
fn include_errors_name_the_included_document() {
    let (diagnostics, options) = collecting(Options::default().with_resolver(documents()));
    let yaml = indoc! {"
        a: !include bad-port.yaml
        b: !include nowhere.yaml
        c: !include broken.yaml
        d: !include port.yaml
    "};
    let loaded = load::<BTreeMap<String, u16>>(yaml, options).unwrap();
    assert_eq!(loaded, Loaded::Success(BTreeMap::from([("d".to_owned(), 8080)])));

    let reported = diagnostics.to_vec();
    let codes: Vec<_> = reported.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        [ErrorCode::ValueError, ErrorCode::IncludeError, ErrorCode::InvalidDocument]
    );
    assert_eq!(reported[0].document.as_deref(), Some("bad-port.yaml"));
    assert_eq!(reported[0].location.line(), 1);
    assert_eq!(reported[1].document, None);
    assert_eq!(reported[1].location.line(), 2);
}

#[test]
fn include_cycles_hit_the_depth_limit() {
    let options = saphyr_schema::options! {
        resolvers: vec![Rc::new(documents()) as Rc<dyn saphyr_schema::Resolver>],
        max_include_depth: 5,
    };
    let err = load::<String>("!include loop.yaml", options).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::IncludeError));
    assert_eq!(err.document(), Some("loop.yaml"));
}

#[test]
fn include_without_resolvers_is_just_a_tag() {
    let loaded = load::<String>("!include port.yaml", Options::default()).unwrap();
    assert_eq!(loaded, Loaded::Success("port.yaml".to_owned()));
}

#[test]
fn fail_fast_error_in_included_document_shows_its_text() {
    let options = Options::default().with_resolver(documents());
    let err = load::<u16>("!include bad-port.yaml", options).unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("bad-port.yaml"), "{rendered}");
    assert!(rendered.contains("eighty"), "{rendered}");
    assert!(matches!(err, Error::WithSnippet { .. }));
}

#[test]
fn glob_loads_every_match_in_order() {
    let (diagnostics, options) = collecting(Options::default().with_resolver(documents()));
    let loaded = load::<Vec<Server>>("!glob servers/*.yaml", options).unwrap();
    let Loaded::Success(servers) = loaded else {
        panic!("glob should produce a list");
    };
    assert_eq!(servers.iter().map(|s| s.host.as_str()).collect::<Vec<_>>(), ["a", "c"]);

    let reported = diagnostics.to_vec();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].code, ErrorCode::MissingRequiredField);
    assert_eq!(reported[0].document.as_deref(), Some("servers/b.yaml"));
}

#[test]
fn glob_list_goes_through_the_list_validation_hook() {
    let resolver = MemoryResolver::new().with("a.yaml", "1").with("b.yaml", "2");
    let (diagnostics, options) = collecting(Options::default().with_resolver(resolver));
    let field = ListField::new(IntField::<i32>::new()).validate(|ctx, values| {
        if values.len() > 1 {
            ctx.error(ErrorCode::ValidationError, "at most one value")?;
            return Ok(false);
        }
        Ok(true)
    });
    assert_eq!(
        load_with_field(&field, "!glob '*.yaml'", options.clone()).unwrap(),
        Loaded::Failed
    );
    assert_eq!(diagnostics.codes(), vec![ErrorCode::ValidationError]);
    assert_eq!(diagnostics.to_vec()[0].location.line(), 1);

    assert_eq!(
        load_with_field(&field, "!glob 'a.*'", options).unwrap(),
        Loaded::Success(vec![1])
    );
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn glob_with_no_match_is_an_empty_list() {
    let options = Options::default().with_resolver(documents());
    assert_eq!(load::<Vec<u16>>("!glob none/*.yaml", options).unwrap(), Loaded::Success(vec![]));
}

#[test]
fn glob_needs_a_list_field() {
    let (diagnostics, options) = collecting(Options::default().with_resolver(documents()));
    assert_eq!(load::<u16>("!glob servers/*.yaml", options).unwrap(), Loaded::Failed);
    assert_eq!(diagnostics.codes(), vec![ErrorCode::UnexpectedNodeType]);
}

#[test]
fn resolvers_are_consulted_in_order() {
    let first = MemoryResolver::new().with("value.yaml", "first").with("only-first.yaml", "x");
    let second = MemoryResolver::new().with("value.yaml", "second").with("extra.yaml", "y");
    let options = Options::default().with_resolver(first).with_resolver(second);
    assert_eq!(
        load::<String>("!include value.yaml", options.clone()).unwrap(),
        Loaded::Success("first".to_owned())
    );
    assert_eq!(
        load::<Vec<String>>("!glob '*.yaml'", options).unwrap(),
        Loaded::Success(vec!["x".into(), "first".into(), "y".into(), "second".into()])
    );
}

#[test]
fn filesystem_roots() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("parts")).unwrap();
    std::fs::write(dir.path().join("parts/one.yaml"), "1").unwrap();
    std::fs::write(dir.path().join("parts/two.yaml"), "2").unwrap();
    std::fs::write(dir.path().join("main.yaml"), "!glob parts/*.yaml").unwrap();

    let options = saphyr_schema::options! { resolve_roots: vec![dir.path().to_path_buf()] };
    assert_eq!(
        load::<Vec<u8>>("!include main.yaml", options).unwrap(),
        Loaded::Success(vec![1, 2])
    );
}

/// Records the location of every node it is asked to load.
struct Where {
    seen: Rc<RefCell<Vec<Option<String>>>>,
}

impl TagHandler for Where {
    fn tag_pattern(&self) -> &str {
        "^where$"
    }

    fn load(
        &self,
        ctx: &mut LoadingContext<'_>,
        field: &dyn AnyField,
    ) -> Result<Loaded<Box<dyn Any>>, Error> {
        self.seen
            .borrow_mut()
            .push(ctx.current_location().map(str::to_owned));
        field.load_any(ctx)
    }
}

#[test]
fn location_is_inherited_below_an_include() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let resolver = MemoryResolver::new().with("nested.yaml", "deep:\n  list: [!where 1]\n");
    let mut options = Options::default()
        .with_resolver(resolver)
        .with_tag_handler(Where { seen: Rc::clone(&seen) });
    options.location = Some("root.yaml".to_owned());
    let field = saphyr_schema::ListField::new(saphyr_schema::DictField::new(
        saphyr_schema::DictField::new(saphyr_schema::ListField::new(IntField::<u8>::new())),
    ));
    let loaded = load_with_field(&field, "- !where {}\n- !include nested.yaml\n", options).unwrap();
    assert!(loaded.is_success());
    assert_eq!(
        *seen.borrow(),
        [Some("root.yaml".to_owned()), Some("nested.yaml".to_owned())]
    );
}
