//! End-to-end tests against the public API, exercising localization, edit-script synthesis
//! and SStuB classification together the way a caller outside this crate would.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sstub_diff::{edit_script::EditScript, error::Error, options::DiffOptions, supported_langs::supported_languages};
use typed_arena::Arena;

#[test]
fn difference_localizes_a_one_line_change() {
    let arena = Arena::new();
    let ref_arena = Arena::new();
    let lang = supported_languages().into_iter().find(|l| l.name == "Python").unwrap();

    let source = sstub_diff::parse("x = compute(a, b)\n", &lang, &arena, &ref_arena).unwrap();
    let target = sstub_diff::parse("x = compute(a, b, c)\n", &lang, &arena, &ref_arena).unwrap();

    let diff = sstub_diff::difference(source, target, DiffOptions::default()).unwrap();
    assert!(diff.is_single_statement());
    assert_eq!(diff.sstub_pattern().unwrap(), sstub_diff::sstub::SStubPattern::SameFunctionMoreArgs);
}

#[test]
fn edit_script_round_trips_through_serialization() {
    let arena = Arena::new();
    let ref_arena = Arena::new();
    let lang = supported_languages().into_iter().find(|l| l.name == "Python").unwrap();

    let source = sstub_diff::parse("def f(x):\n    return x + 1\n", &lang, &arena, &ref_arena).unwrap();
    let target = sstub_diff::parse("def f(x):\n    return x + 2\n", &lang, &arena, &ref_arena).unwrap();

    let diff = sstub_diff::difference(source, target, DiffOptions::default()).unwrap();
    let script = diff.edit_script();
    assert!(!script.is_empty());

    let text = script.serialize();
    let parsed = EditScript::deserialize(&text, source).unwrap();
    assert_eq!(parsed, script);
}

#[test]
fn identical_trees_report_no_diff() {
    let arena = Arena::new();
    let ref_arena = Arena::new();
    let lang = supported_languages().into_iter().find(|l| l.name == "Python").unwrap();

    let source = sstub_diff::parse("x = 1\n", &lang, &arena, &ref_arena).unwrap();
    let target = sstub_diff::parse("x = 1\n", &lang, &arena, &ref_arena).unwrap();

    assert!(matches!(sstub_diff::difference(source, target, DiffOptions::default()), Err(Error::IdenticalTrees)));
}

#[test]
fn sstub_pattern_is_unsupported_outside_python() {
    let arena = Arena::new();
    let ref_arena = Arena::new();
    let lang = supported_languages().into_iter().find(|l| l.name == "JavaScript").unwrap();

    let source = sstub_diff::parse("x = 1;\n", &lang, &arena, &ref_arena).unwrap();
    let target = sstub_diff::parse("x = 2;\n", &lang, &arena, &ref_arena).unwrap();

    let diff = sstub_diff::difference(source, target, DiffOptions::default()).unwrap();
    assert!(matches!(diff.sstub_pattern(), Err(Error::UnsupportedPatternLang { .. })));
}

#[rstest]
#[case("test()", "test2()", "WrongFunctionName")]
#[case("test(x)", "test(x, y)", "SameFunctionMoreArgs")]
#[case("test(x, y)", "test(x)", "SameFunctionLessArgs")]
#[case("result = x", "result = int(x)", "AddFunctionAroundExpression")]
#[case("result = 3", "result = 3.0", "ChangeConstantType")]
#[case("result = person.name", "result = person.age", "ChangeAttributeUsed")]
fn sstub_pattern_table(#[case] before: &str, #[case] after: &str, #[case] expected: &str) {
    let arena = Arena::new();
    let ref_arena = Arena::new();
    let lang = supported_languages().into_iter().find(|l| l.name == "Python").unwrap();

    let source = sstub_diff::parse(before, &lang, &arena, &ref_arena).unwrap();
    let target = sstub_diff::parse(after, &lang, &arena, &ref_arena).unwrap();

    let diff = sstub_diff::difference(source, target, DiffOptions::default()).unwrap();
    let pattern = diff.sstub_pattern().unwrap();
    assert_eq!(format!("{pattern:?}"), expected, "for {before:?} -> {after:?}");
}

#[test]
fn languages_listing_is_non_empty() {
    assert!(!supported_languages().is_empty());
    assert!(sstub_diff::languages(true).contains("diff=sstub-python"));
}
