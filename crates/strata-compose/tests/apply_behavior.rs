//! Tests for how `Composer::apply` patches a target configuration.

use serde_json::{json, Value};
use strata_compose::{
    ComposeError, Composer, FnLibrary, Rule, TargetConfig,
    PARALLEL_COMPILE_LOADER, TRANSFORM_LOADER,
};
use strata_rules::{Condition, MatchCondition, Pattern, RuleCondition};

const CSS_LIBRARY: &str = "/project/node_modules/css-library";

fn css() -> Pattern {
    Pattern::new(r"\.css$").unwrap()
}

fn with_css_library(composer: &mut Composer) {
    let library = FnLibrary::new("css-library", CSS_LIBRARY, |composer: &mut Composer, _: &Value| {
        composer.add_library_scoped_rule(Rule::new().test(css()).loader("css-loader"))?;
        Ok(())
    });
    composer.add_library(&library, &Value::Null).unwrap();
}

fn with_global_css_library(composer: &mut Composer, options: Value) -> strata_compose::Result<()> {
    let library = FnLibrary::new(
        "global-css-library",
        "/project/node_modules/global-css-library",
        |composer: &mut Composer, options: &Value| {
            let mut rule = Rule::new().test(css()).loader("css-loader");
            if let Some(include) = options.get("include").and_then(Value::as_str) {
                rule = rule.include(include);
            }
            composer.add_global_scoped_rule(rule)?;
            Ok(())
        },
    );
    composer.add_library(&library, &options)?;
    Ok(())
}

fn test_only(pattern: Pattern) -> Condition {
    Condition::from(MatchCondition {
        test: Some(pattern.into()),
        ..MatchCondition::default()
    })
}

#[test]
fn transform_rule_defaults() {
    let mut composer = Composer::new();
    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    assert_eq!(target.module.rules.len(), 1);
    let rule = &target.module.rules[0];
    let Some(RuleCondition::Pattern(test)) = &rule.test else {
        panic!("transform rule should test a pattern, got {:?}", rule.test);
    };
    assert!(test.is_match("Main.jsx"));

    let stages = rule.use_entries.as_ref().unwrap();
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0].loader, PARALLEL_COMPILE_LOADER);
    assert_eq!(stages[1].loader, TRANSFORM_LOADER);

    let options = stages[1].options.as_ref().unwrap();
    assert_eq!(options["sourceMaps"], json!(true));

    let babel = composer.provider().babel_options();
    assert_eq!(options["plugins"], serde_json::to_value(&babel.plugins).unwrap());
    assert_eq!(options["presets"], serde_json::to_value(&babel.presets).unwrap());
}

#[test]
fn transform_rule_test_can_be_overridden() {
    let mut composer = Composer::new();
    composer.set_transform_rule_test(r"\.foobar$").unwrap();

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    let Some(RuleCondition::Pattern(test)) = &target.module.rules[0].test else {
        panic!("transform rule should test a pattern");
    };
    assert!(test.is_match(".foobar"));
    assert!(!test.is_match(".jsx"));
}

#[test]
fn transform_rule_can_be_left_out() {
    let mut composer = Composer::new();
    composer.without_transform_rule();

    let mut target = TargetConfig::default()
        .with_rule(Rule::new().test(Pattern::new(r".jsx$").unwrap()).loader("babel-loader"));
    composer.apply(&mut target).unwrap();
    assert_eq!(target.module.rules.len(), 1);
}

#[test]
fn parallel_stage_can_be_left_out() {
    let mut composer = Composer::new();
    composer.without_parallel_compilation();

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    let stages = target.module.rules[0].use_entries.as_ref().unwrap();
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0].loader, TRANSFORM_LOADER);
}

#[test]
fn source_maps_can_be_disabled() {
    let mut composer = Composer::new();
    composer.without_source_maps();

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    let stages = target.module.rules[0].use_entries.as_ref().unwrap();
    assert_eq!(stages[1].options.as_ref().unwrap()["sourceMaps"], json!(false));
}

#[test]
fn transform_rule_excludes_are_applied() {
    let mut composer = Composer::new();
    let js = Pattern::new(r"\.js").unwrap();
    let library = FnLibrary::new("exclude", "/project/libs/exclude", {
        let js = js.clone();
        move |composer: &mut Composer, _: &Value| {
            composer.add_transform_rule_exclude(js.clone());
            Ok(())
        }
    });
    composer.add_library(&library, &Value::Null).unwrap();

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    let Some(RuleCondition::List(excludes)) = &target.module.rules[0].exclude else {
        panic!("exclude should be normalized to a list");
    };
    assert_eq!(excludes[0], RuleCondition::Pattern(js));
}

#[test]
fn library_rules_are_scoped_to_the_library_path() {
    let mut composer = Composer::new();
    with_css_library(&mut composer);

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    assert_eq!(target.module.rules.len(), 2);
    assert_eq!(
        target.module.rules[1],
        Rule::new()
            .include(CSS_LIBRARY)
            .rules(vec![Rule::new().test(css()).loader("css-loader")])
    );
}

#[test]
fn library_rules_take_precedence_on_library_files() {
    let mut composer = Composer::new();
    with_css_library(&mut composer);

    let mut target = TargetConfig::default().with_rule(Rule::new().test(css()).loader("less-loader"));
    composer.apply(&mut target).unwrap();

    assert_eq!(target.module.rules.len(), 3);
    let user_rule = &target.module.rules[0];
    let shadow = Condition::all(vec![CSS_LIBRARY.into(), test_only(css())]);
    assert_eq!(
        user_rule.exclude,
        Some(RuleCondition::List(vec![shadow.into()]))
    );
    assert_eq!(user_rule.loader.as_deref(), Some("less-loader"));

    assert!(user_rule.matches("/project/src/site.css"));
    assert!(!user_rule.matches(&format!("{CSS_LIBRARY}/button.css")));
    assert!(target.module.rules[2].matches(&format!("{CSS_LIBRARY}/button.css")));
}

#[test]
fn library_rules_are_not_excluded_from_themselves() {
    let mut composer = Composer::new();
    with_css_library(&mut composer);

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    assert!(target.module.rules[1].exclude.is_none());
}

#[test]
fn global_rules_take_precedence_without_and_wrapping() {
    let mut composer = Composer::new();
    with_global_css_library(&mut composer, json!({ "include": "/" })).unwrap();

    let expected = Condition::from(MatchCondition {
        test: Some(css().into()),
        include: Some("/".into()),
        ..MatchCondition::default()
    });
    assert_eq!(composer.non_library_excludes(), &[expected.clone()]);

    let mut target = TargetConfig::default().with_rule(Rule::new().test(css()).loader("less-loader"));
    composer.apply(&mut target).unwrap();

    assert_eq!(target.module.rules.len(), 3);
    let user_rule = &target.module.rules[0];
    assert_eq!(user_rule.exclude, Some(RuleCondition::List(vec![expected.into()])));
    assert_eq!(user_rule.loader.as_deref(), Some("less-loader"));
    assert_eq!(
        target.module.rules[2],
        Rule::new().test(css()).loader("css-loader").include("/")
    );
}

#[test]
fn global_rules_require_include() {
    let mut composer = Composer::new();
    let err = with_global_css_library(&mut composer, Value::Null).unwrap_err();
    assert!(matches!(
        err,
        ComposeError::InvalidArgument {
            operation: "add_global_scoped_rule",
            ..
        }
    ));
    assert!(err.to_string().contains("`include` property"));
}

#[test]
fn global_rules_reject_an_empty_include() {
    let mut composer = Composer::new();
    let err = with_global_css_library(&mut composer, json!({ "include": "" })).unwrap_err();
    assert!(matches!(
        err,
        ComposeError::InvalidArgument {
            operation: "add_global_scoped_rule",
            ..
        }
    ));
    assert!(composer.non_library_excludes().is_empty());
    assert!(composer.library_rules().is_empty());

    let mut target = TargetConfig::default().with_rule(Rule::new().test(css()).loader("less-loader"));
    composer.apply(&mut target).unwrap();
    assert!(target.module.rules[0].matches("/app/src/site.css"));
}

#[test]
fn library_rules_with_an_empty_exclude_are_accepted() {
    let mut composer = Composer::new();
    let library = FnLibrary::new("css-library", CSS_LIBRARY, |composer: &mut Composer, _: &Value| {
        composer.add_library_scoped_rule(Rule::new().test(css()).exclude("").loader("css-loader"))?;
        Ok(())
    });
    composer.add_library(&library, &Value::Null).unwrap();

    let shadow = Condition::all(vec![CSS_LIBRARY.into(), test_only(css())]);
    assert_eq!(composer.non_library_excludes(), &[shadow]);
}

#[test]
fn existing_single_exclude_is_wrapped_in_a_list() {
    let mut composer = Composer::new();
    composer.without_transform_rule();
    with_css_library(&mut composer);

    let mut target = TargetConfig::default().with_rule(
        Rule::new()
            .test(css())
            .exclude("/project/vendor")
            .loader("less-loader"),
    );
    composer.apply(&mut target).unwrap();

    let Some(RuleCondition::List(excludes)) = &target.module.rules[0].exclude else {
        panic!("exclude should be normalized to a list");
    };
    assert_eq!(excludes.len(), 2);
    assert_eq!(excludes[0], RuleCondition::Path("/project/vendor".to_string()));
}

#[test]
fn user_aliases_override_library_aliases() {
    let mut composer = Composer::new();
    composer.add_alias("Foo", "a").add_alias("Bar", "c");

    let mut target = TargetConfig::default().with_alias("Foo", "b");
    composer.apply(&mut target).unwrap();

    assert_eq!(target.resolve.alias["Foo"], "b");
    assert_eq!(target.resolve.alias["Bar"], "c");
}

#[test]
fn apply_is_deterministic() {
    let run = || {
        let mut composer = Composer::new();
        with_css_library(&mut composer);
        with_global_css_library(&mut composer, json!({ "include": "/shared" })).unwrap();
        let mut target = TargetConfig::default()
            .with_rule(Rule::new().test(css()).loader("less-loader"))
            .with_rule(Rule::new().test(Pattern::new(r"\.svg$").unwrap()).loader("svg-loader"));
        composer.apply(&mut target).unwrap();
        target.to_value().unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn registration_order_is_preserved() {
    let mut composer = Composer::new();
    with_css_library(&mut composer);
    with_global_css_library(&mut composer, json!({ "include": "/shared" })).unwrap();

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();

    let Some(RuleCondition::List(excludes)) = &target.module.rules[0].exclude else {
        panic!("exclude should be normalized to a list");
    };
    assert_eq!(excludes.len(), 2);
    assert!(matches!(&excludes[0], RuleCondition::Object(object) if object.and.is_some()));
    assert!(matches!(&excludes[1], RuleCondition::Object(object) if object.include.is_some()));

    assert_eq!(target.module.rules[1].include, Some(RuleCondition::from(CSS_LIBRARY)));
    assert_eq!(target.module.rules[2].include, Some(RuleCondition::from("/shared")));
}

#[test]
fn second_apply_is_rejected() {
    let mut composer = Composer::new();
    with_css_library(&mut composer);

    let mut target = TargetConfig::default();
    composer.apply(&mut target).unwrap();
    let snapshot = target.clone();

    let err = composer.apply(&mut target).unwrap_err();
    assert!(matches!(err, ComposeError::AlreadyApplied));
    assert_eq!(target, snapshot);
}

#[test]
fn apply_output_serializes_for_the_bundler() {
    let mut composer = Composer::new();
    composer.without_transform_rule();
    with_css_library(&mut composer);

    let mut target = TargetConfig::from_value(json!({ "entry": "main.js" })).unwrap();
    composer.apply(&mut target).unwrap();

    assert_eq!(
        target.to_value().unwrap(),
        json!({
            "entry": "main.js",
            "resolve": { "alias": {} },
            "module": {
                "rules": [{
                    "include": CSS_LIBRARY,
                    "rules": [{ "test": { "pattern": r"\.css$" }, "loader": "css-loader" }]
                }]
            }
        })
    );
}
