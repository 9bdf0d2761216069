//! End-to-end matching behaviour: ordering, captures, guards and results

use casematch::{
    build, CaseSpec, Callable, CaptureKey, Introspector, MatchConfig, MatchError, Matcher,
    MatcherBuilder, NoMatchError, ResultSpec, Services,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn greater_than(limit: i64) -> Callable {
    Callable::new(["x"], move |args| json!(args[0].as_i64().map_or(false, |x| x > limit)))
        .named(format!("greater_than_{}", limit))
}

#[test]
fn test_first_match_wins() {
    let matcher = build(vec![
        CaseSpec::new([1], ResultSpec::value("one")),
        CaseSpec::new(["_"], ResultSpec::value("any")),
    ])
    .unwrap();

    assert_eq!(matcher.match_one(json!(1)).unwrap(), json!("one"));
    assert_eq!(matcher.match_one(json!(2)).unwrap(), json!("any"));
}

#[test]
fn test_later_case_never_shadows_earlier() {
    let matcher = MatcherBuilder::new()
        .when("_")
        .value("first")
        .when(1)
        .value("second")
        .build()
        .unwrap();

    assert_eq!(matcher.match_one(json!(1)).unwrap(), json!("first"));
}

#[test]
fn test_wildcard_capture_and_guards() {
    let matcher = MatcherBuilder::new()
        .when("_x")
        .guard(greater_than(100))
        .value("huge")
        .when("_x")
        .guard(greater_than(10))
        .capture("x")
        .build()
        .unwrap();

    assert_eq!(matcher.match_one(json!(42)).unwrap(), json!(42));
    assert_eq!(matcher.match_one(json!(420)).unwrap(), json!("huge"));

    let err = matcher.match_one(json!(3)).unwrap_err();
    assert!(err.is_no_match());
    assert_eq!(err.diagnostics().len(), 2);
    assert!(err.diagnostics()[0].contains("greater_than_100(x)"));
    assert!(err.diagnostics()[1].contains("greater_than_10(x)"));
}

#[test]
fn test_exhaustion_is_no_match() {
    let matcher = build(vec![CaseSpec::new([1], ResultSpec::value("one"))]).unwrap();

    assert_eq!(
        matcher.match_one(json!(2)).unwrap_err(),
        MatchError::NoMatch(NoMatchError::default())
    );
}

#[test]
fn test_regex_named_groups_take_precedence() {
    let matcher = MatcherBuilder::new()
        .when(r"/^(?P<user>\w+):(\d+)$/")
        .call(Callable::variadic(|args| Value::Array(args.to_vec())))
        .build()
        .unwrap();

    // The unnamed group is dropped, so the only capture is `user`.
    let user = Callable::new(["user"], |args| args[0].clone());
    let by_name = MatcherBuilder::new()
        .when(r"/^(?P<user>\w+):(\d+)$/")
        .call(user)
        .build()
        .unwrap();

    assert_eq!(by_name.match_one(json!("ada:42")).unwrap(), json!("ada"));
    // Nothing positional was captured, so an unbound call receives the argument.
    assert_eq!(matcher.match_one(json!("ada:42")).unwrap(), json!(["ada:42"]));
}

#[test]
fn test_regex_positional_groups() {
    let matcher = MatcherBuilder::new()
        .when(r"/^(\w+)@(\w+)\.com$/")
        .capture(0usize)
        .build()
        .unwrap();

    assert_eq!(
        matcher.match_one(json!("ada@example.com")).unwrap(),
        json!(["ada@example.com", "ada", "example"])
    );
}

#[test]
fn test_call_binds_by_name_then_position() {
    let describe = Callable::new(["unit", "amount"], |args| {
        json!(format!("{} {}", args[1], args[0].as_str().unwrap_or("?")))
    });
    let matcher = MatcherBuilder::new()
        .when(r"/^(\d+)$/")
        .when("_unit")
        .call(describe)
        .build()
        .unwrap();

    // `unit` binds by name; `amount` takes the first positional capture.
    assert_eq!(
        matcher.match_args(&[json!("12"), json!("kg")]).unwrap(),
        json!(r#"["12","12"] kg"#)
    );
}

#[test]
fn test_continue_remaps_arguments() {
    let inner = MatcherBuilder::new()
        .when("_a")
        .when(0)
        .value("divide by zero")
        .when("_a")
        .when("_b")
        .call(Callable::new(["a", "b"], |args| {
            json!(args[0].as_i64().unwrap_or(0) / args[1].as_i64().unwrap_or(1))
        }))
        .build()
        .unwrap();

    let outer = MatcherBuilder::new()
        .when("div")
        .when("_n")
        .when("_d")
        .continue_with(["n", "d"], inner.clone())
        .when("_op")
        .when("_")
        .when("_")
        .value("unknown op")
        .build()
        .unwrap();

    assert_eq!(
        outer.match_args(&[json!("div"), json!(9), json!(3)]).unwrap(),
        json!(3)
    );
    assert_eq!(
        outer.match_args(&[json!("div"), json!(9), json!(0)]).unwrap(),
        json!("divide by zero")
    );
    assert_eq!(
        outer.match_args(&[json!("mul"), json!(9), json!(3)]).unwrap(),
        json!("unknown op")
    );
}

#[test]
fn test_continue_propagates_no_match() {
    let inner = build(vec![CaseSpec::new([1], ResultSpec::value("one"))]).unwrap();
    let outer = build(vec![
        CaseSpec::new(["_x"], ResultSpec::continue_with(["x"], inner)),
        CaseSpec::new(["_"], ResultSpec::value("unreached")),
    ])
    .unwrap();

    assert_eq!(outer.match_one(json!(1)).unwrap(), json!("one"));
    assert!(outer.match_one(json!(2)).unwrap_err().is_no_match());
}

#[test]
fn test_continue_uncaptured_name_takes_positional() {
    let echo = build(vec![CaseSpec::new(["_v"], ResultSpec::capture("v"))]).unwrap();
    let outer = MatcherBuilder::new()
        .when(r"/^(\d+)$/")
        .continue_with(["zz"], echo)
        .build()
        .unwrap();

    assert_eq!(outer.match_one(json!("42")).unwrap(), json!(["42", "42"]));
}

#[test]
fn test_continue_without_bind_forwards_arguments() {
    let pair = build(vec![CaseSpec::new(
        ["_a", "_b"],
        ResultSpec::call(Callable::new(["a", "b"], |args| json!([args[1], args[0]]))),
    )])
    .unwrap();
    let swap = MatcherBuilder::new()
        .when("_x")
        .when("_y")
        .continue_with(Vec::<String>::new(), pair)
        .build()
        .unwrap();
    assert_eq!(swap.match_args(&[json!(1), json!(2)]).unwrap(), json!([2, 1]));

    // Positional captures take precedence over the raw arguments.
    let echo = build(vec![CaseSpec::new(["_v"], ResultSpec::capture("v"))]).unwrap();
    let groups = MatcherBuilder::new()
        .when(r"/^(\w)(\w)$/")
        .continue_with(Vec::<String>::new(), echo)
        .build()
        .unwrap();
    assert_eq!(groups.match_one(json!("ab")).unwrap(), json!(["ab", "a", "b"]));
}

#[test]
fn test_continue_runs_out_of_positional_captures() {
    let inner = build(vec![CaseSpec::new(["_", "_"], ResultSpec::value("both"))]).unwrap();
    let outer = MatcherBuilder::new()
        .when(r"/^(\d+)$/")
        .continue_with(["zz", "yy"], inner)
        .build()
        .unwrap();

    assert_eq!(
        outer.match_one(json!("42")).unwrap_err(),
        MatchError::MissingCapture {
            case: 0,
            key: "'yy'".to_string()
        }
    );
}

#[test]
fn test_nested_matcher_destructures() {
    let pair = Callable::new(["v"], |args| match args[0].as_array() {
        Some(items) if items.len() == 2 => json!({ "left": items[0], "right": items[1] }),
        _ => json!(false),
    });
    let split = build(vec![CaseSpec::new([pair], ResultSpec::call(Callable::new(
        ["left", "right"],
        |args| json!({ "left": args[0], "right": args[1] }),
    )))])
    .unwrap();

    let matcher = MatcherBuilder::new()
        .when(split)
        .call(Callable::new(["left", "right"], |args| {
            json!(args[0].as_i64().unwrap_or(0) + args[1].as_i64().unwrap_or(0))
        }))
        .otherwise()
        .value("not a pair")
        .build()
        .unwrap();

    assert_eq!(matcher.match_one(json!([2, 5])).unwrap(), json!(7));
    assert_eq!(matcher.match_one(json!([1, 2, 3])).unwrap(), json!("not a pair"));
}

#[test]
fn test_nested_non_object_result_is_positional() {
    let length = build(vec![CaseSpec::new(
        ["_s"],
        ResultSpec::call(Callable::new(["s"], |args| {
            json!(args[0].as_str().map_or(0, str::len))
        })),
    )])
    .unwrap();
    let matcher = build(vec![CaseSpec::new([length], ResultSpec::capture(0usize))]).unwrap();

    assert_eq!(matcher.match_one(json!("hello")).unwrap(), json!(5));
}

#[test]
fn test_runtime_collision_is_reported() {
    let tagger = Callable::new(["v"], |_| json!({ "tag": "a" }));
    let matcher = build(vec![CaseSpec::new(
        [casematch::PatternSpec::from(tagger), "_tag".into()],
        ResultSpec::value(1),
    )])
    .unwrap();

    let err = matcher.match_args(&[json!(1), json!(2)]).unwrap_err();
    assert!(matches!(err, MatchError::Collision(ref c) if c.name == "tag" && c.case == 0));
}

#[test]
fn test_pattern_error_is_surfaced_on_use() {
    let matcher = build(vec![
        CaseSpec::new(["x"], ResultSpec::value("bad")),
        CaseSpec::new(["_"], ResultSpec::value("any")),
    ])
    .unwrap();

    for _ in 0..2 {
        let err = matcher.match_one(json!("x")).unwrap_err();
        assert!(matches!(err, MatchError::Pattern { case: 0, slot: 0, .. }));
    }
    assert_eq!(matcher.stats().compilations, 1);
}

#[test]
fn test_compilation_is_idempotent() {
    let matcher = build(vec![
        CaseSpec::new(["/^a/", "_x"], ResultSpec::value("a")),
        CaseSpec::new(["_", "_"], ResultSpec::value("other")),
    ])
    .unwrap();

    assert_eq!(matcher.stats().compilations, 0);
    matcher.match_args(&[json!("abc"), json!(1)]).unwrap();
    assert_eq!(matcher.stats().compilations, 2);
    matcher.match_args(&[json!("abc"), json!(1)]).unwrap();
    assert_eq!(matcher.stats().compilations, 2);
    matcher.match_args(&[json!("xyz"), json!(1)]).unwrap();
    assert_eq!(matcher.stats().compilations, 4);
    matcher.match_args(&[json!("xyz"), json!(1)]).unwrap();
    assert_eq!(matcher.stats().compilations, 4);
    assert_eq!(matcher.stats().compiled_slots, 4);
}

#[test]
fn test_guard_binding_derived_once() {
    let calls = Arc::new(AtomicUsize::new(0));

    #[derive(Debug)]
    struct Counting(Arc<AtomicUsize>);

    impl Introspector for Counting {
        fn parameter_names_of(&self, callable: &Callable) -> Vec<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            callable.declared_parameters().to_vec()
        }
    }

    let services = Services::default().with_introspector(Arc::new(Counting(Arc::clone(&calls))));
    let matcher = MatcherBuilder::new()
        .when("_x")
        .guard(greater_than(0))
        .capture("x")
        .with_services(services)
        .build()
        .unwrap();

    for n in 1..5 {
        assert_eq!(matcher.match_one(json!(n)).unwrap(), json!(n));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cached_binding_missing_capture() {
    let keyed = Callable::new(["v"], |args| {
        if args[0].is_i64() {
            json!({ "x": args[0] })
        } else {
            json!({ "y": args[0] })
        }
    });
    let matcher = Matcher::new(vec![
        CaseSpec::new([keyed], ResultSpec::value(1)).with_guard(Callable::new(["x"], |_| json!(true))),
    ])
    .unwrap();

    assert_eq!(matcher.match_one(json!(7)).unwrap(), json!(1));
    assert_eq!(
        matcher.match_one(json!("s")).unwrap_err(),
        MatchError::MissingCapture {
            case: 0,
            key: "'x'".to_string()
        }
    );
}

#[test]
fn test_capture_key_rendering() {
    assert_eq!(CaptureKey::from("x").to_string(), "'x'");
    assert_eq!(CaptureKey::from(2usize).to_string(), "#2");
}

#[test]
fn test_recursion_limit_from_config() {
    let leaf = build(vec![CaseSpec::new(["_"], ResultSpec::value("leaf"))]).unwrap();
    let mid = build(vec![CaseSpec::new([leaf], ResultSpec::value("mid"))]).unwrap();

    let shallow = Matcher::with_config(
        vec![CaseSpec::new([mid.clone()], ResultSpec::value("top"))],
        MatchConfig::default().with_max_depth(1),
    )
    .unwrap();
    assert_eq!(
        shallow.match_one(json!(1)).unwrap_err(),
        MatchError::RecursionLimit { limit: 1 }
    );

    let deep = Matcher::with_config(
        vec![CaseSpec::new([mid], ResultSpec::value("top"))],
        MatchConfig::default().with_max_depth(2),
    )
    .unwrap();
    assert_eq!(deep.match_one(json!(1)).unwrap(), json!("top"));
}

#[test]
fn test_shared_across_threads() {
    let matcher = build(vec![
        CaseSpec::new(["/^(?P<n>\\d+)$/"], ResultSpec::capture("n")),
        CaseSpec::new(["_v"], ResultSpec::capture("v")),
    ])
    .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let matcher = matcher.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(
                        matcher.match_one(json!(i.to_string())).unwrap(),
                        json!(i.to_string())
                    );
                    assert_eq!(matcher.match_one(json!(i)).unwrap(), json!(i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = matcher.stats();
    assert_eq!(stats.compilations, 2);
    assert_eq!(stats.compiled_slots, 2);
}
