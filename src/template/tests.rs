use std::collections::BTreeMap;

use holesmith_ops::{PrimitiveType, Type, Value};

use super::*;

fn load_err(source: &str) -> TemplateError {
    match Template::from_toml("test.toml", source) {
        Ok(_) => panic!("template should be rejected"),
        Err(e) => e,
    }
}

const HEADER: &str = r#"
name = "T"

[[symbols]]
name = "x"
type = "int"

[[symbols]]
name = "b"
type = "byte"
"#;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn demos_load() {
    for name in available_templates() {
        Template::load(name).unwrap_or_else(|e| panic!("{name}: {e}"));
    }
    assert_eq!(Template::load("scenario-a").unwrap().hole_count(), 1);
    assert_eq!(Template::load("scenario-b").unwrap().hole_count(), 2);
}

#[test]
fn guards_record_nested_holes() {
    let template = Template::load("arrays").unwrap();
    assert_eq!(template.hole_count(), 5);

    let loop_guard = template.hole(HoleId(1)).unwrap().guard.clone().unwrap();
    assert_eq!(loop_guard.then, vec![HoleId(2)]);
    assert!(loop_guard.unreachable_when(true).is_empty());
    assert_eq!(loop_guard.unreachable_when(false), &[HoleId(2)]);

    let branch = template.hole(HoleId(3)).unwrap().guard.clone().unwrap();
    assert_eq!(branch.unreachable_when(true), &[HoleId(5)]);
    assert_eq!(branch.unreachable_when(false), &[HoleId(4)]);

    assert!(!template.hole(HoleId(2)).unwrap().is_condition());
}

#[test]
fn initial_environment() {
    let template = Template::load("arrays").unwrap();
    let env = template.environment();
    assert_eq!(
        env.read("a"),
        Some(&Value::Array(
            PrimitiveType::Int,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        ))
    );
    assert_eq!(env.read("total"), Some(&Value::Long(0)));
    assert_eq!(env.get("n").map(|s| s.ty), Some(Type::INT));
}

#[test]
fn unknown_template() {
    assert!(matches!(
        Template::load("nope"),
        Err(TemplateError::UnknownTemplate { .. })
    ));
}

#[test]
fn malformed_toml() {
    assert!(matches!(load_err("name = "), TemplateError::Parse { .. }));
}

#[test]
fn duplicate_and_zero_holes() {
    let body = r#"
[[body]]
assign = { target = "x", value = { hole = 1, node = { kind = "literal", type = "int", values = [1] } } }
[[body]]
assign = { target = "x", value = { hole = 1, node = { kind = "literal", type = "int", values = [2] } } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::DuplicateHole { id: 1 }
    ));

    let body = r#"
[[body]]
assign = { target = "x", value = { hole = 0, node = { kind = "literal", type = "int", values = [1] } } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::InvalidHoleId
    ));
}

#[test]
fn conditions_must_be_boolean() {
    let body = r#"
[[body]]
[body.if]
cond = { hole = 1, node = { kind = "ident", type = "int", names = ["x"] } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::NonBooleanCondition { .. }
    ));
}

#[test]
fn expression_statements_need_side_effects() {
    let body = r#"
[[body]]
eval = { hole = 1, node = { kind = "alt", options = [{ kind = "pre_inc", target = { kind = "ident", type = "int", names = ["x"] } }, { kind = "ident", type = "int", names = ["x"] }] } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::NotAStatement { .. }
    ));
}

#[test]
fn fixed_code_must_be_unambiguous() {
    let body = r#"
[[body]]
assign = { target = "x", value = { kind = "literal", type = "int", values = [1, 2] } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::AmbiguousFixedCode { .. }
    ));

    let body = r#"
[[body]]
assign = { target = "x", value = { kind = "ident", type = "int" } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::AmbiguousFixedCode { .. }
    ));
}

#[test]
fn literal_ranges_must_fit_their_type() {
    let body = r#"
[[body]]
assign = { target = "b", value = { hole = 1, node = { kind = "literal", type = "byte", low = 0, high = 300 } } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::Build {
            source: holesmith_choice::BuildError::RangeOutOfType { low: 0, high: 300, .. },
            ..
        }
    ));

    let body = r#"
[[body]]
assign = { target = "b", value = { hole = 1, node = { kind = "literal", type = "byte", low = -128, high = 128 } } }
"#;
    Template::from_toml("test.toml", &format!("{HEADER}{body}")).unwrap();
}

#[test]
fn symbols_are_checked() {
    let body = r#"
[[body]]
assign = { target = "y", value = { kind = "const", type = "int", value = 1 } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::UnknownSymbol { name } if name == "y"
    ));

    let body = r#"
[[body]]
assign = { target = "b", value = { kind = "const", type = "int", value = 1 } }
"#;
    assert!(matches!(
        load_err(&format!("{HEADER}{body}")),
        TemplateError::Build { .. }
    ));

    let source = r#"
name = "T"
[[symbols]]
name = "b"
type = "byte"
value = 300
"#;
    assert!(matches!(
        load_err(source),
        TemplateError::InvalidValue { name, .. } if name == "b"
    ));
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(template: &Template, fills: &[(u32, &str)], conditions: &[(u32, bool)]) -> String {
    let fills: BTreeMap<HoleId, String> = fills
        .iter()
        .map(|(id, text)| (HoleId(*id), text.to_string()))
        .collect();
    let conditions: BTreeMap<HoleId, bool> =
        conditions.iter().map(|(id, v)| (HoleId(*id), *v)).collect();
    render_unit(
        template,
        &Rendering {
            class_name: "ScenarioAGen1",
            fills: &fills,
            conditions: &conditions,
            invocations: 10,
        },
    )
    .unwrap()
}

#[test]
fn renders_filled_unit() {
    let template = Template::load("scenario-a").unwrap();
    let expected = "\
public class ScenarioAGen1 {
    static int x = 0;

    static void entry() {
        x = 2;
    }

    public static void main(String[] args) {
        for (int i = 0; i < 10; i++) {
            try {
                entry();
            } catch (ArithmeticException | ArrayIndexOutOfBoundsException e) {
            }
        }
    }
}
";
    assert_eq!(render(&template, &[(1, "2")], &[]), expected);
}

#[test]
fn unfilled_holes_call_the_helper() {
    let template = Template::load("scenario-b").unwrap();
    let source = render(&template, &[(1, "1")], &[]);
    assert!(source.contains("x = 1;"));
    assert!(source.contains("flag = hole(2);"));
    assert!(source.contains("private static <T> T hole(int id) {"));

    let source = render(&template, &[(1, "1"), (2, "true")], &[]);
    assert!(!source.contains("hole("));
}

#[test]
fn fixed_conditions_drop_dead_branches() {
    let template = Template::load("arrays").unwrap();
    let fills = [(1, "i < 3"), (3, "n > 0 && total == 6L")];

    let source = render(&template, &fills, &[(3, false)]);
    assert!(!source.contains("n = hole(4);"), "then-branch should be gone");
    assert!(source.contains("hole(5);"));
    assert!(!source.contains("if ("));

    let source = render(&template, &fills, &[(3, true)]);
    assert!(source.contains("if (true) {"));
    assert!(!source.contains("hole(5)"));

    let source = render(&template, &fills, &[(1, false)]);
    assert!(!source.contains("while"));
    assert!(!source.contains("hole(2)"));
}

#[test]
fn fixed_code_renders_bare() {
    let template = Template::load("arrays").unwrap();
    let source = render(&template, &[], &[]);
    assert!(source.contains("++i;"));
    assert!(source.contains("while (hole(1)) {"));
    assert!(source.contains("static int[] a = new int[] {1, 2, 3};"));
}
