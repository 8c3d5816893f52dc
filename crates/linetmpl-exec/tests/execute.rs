use linetmpl_exec::{ExecError, FuncError, FuncMap, MissingKey, Template};
use proptest::prelude::*;
use serde_json::{json, Value};

fn render(source: &str, data: &Value) -> String {
    Template::new("t")
        .parse(source)
        .unwrap()
        .render(data)
        .unwrap()
}

fn render_err(source: &str, data: &Value) -> String {
    Template::new("t")
        .parse(source)
        .unwrap()
        .render(data)
        .unwrap_err()
        .to_string()
}

#[test]
fn plate_path_with_square_delimiters() {
    let tmpl = Template::new("plate")
        .delims("[", "]")
        .parse("/[.Date]/[.Plate]/[.Year]")
        .unwrap();
    let data = json!({"Date": "20180201", "Plate": "ABC123", "Year": "2018"});
    assert_eq!(tmpl.render(&data).unwrap(), "/20180201/ABC123/2018");
}

#[test]
fn delimiters_do_not_change_output() {
    let data = json!({"A": {"B": [1, 2]}, "N": "x"});
    let square = Template::new("t")
        .delims("[", "]")
        .parse("<[.N]>[range .A.B]([.])[end]")
        .unwrap();
    let braces = Template::new("t")
        .parse("<{{.N}}>{{range .A.B}}({{.}}){{end}}")
        .unwrap();
    assert_eq!(square.render(&data).unwrap(), braces.render(&data).unwrap());
    assert_eq!(braces.render(&data).unwrap(), "<x>(1)(2)");
}

#[test]
fn unicode_field_names() {
    let out = render("{{.名前}}さん", &json!({"名前": "太郎"}));
    assert_eq!(out, "太郎さん");
}

#[test]
fn comments_and_trim_markers() {
    assert_eq!(render("a{{/* note */}}b", &json!({})), "ab");
    assert_eq!(render("a  {{- 1 -}}  b", &json!({})), "a1b");
}

#[test]
fn if_else_chain() {
    let source = "{{if .A}}a{{else if .B}}b{{else}}none{{end}}";
    assert_eq!(render(source, &json!({"A": 1})), "a");
    assert_eq!(render(source, &json!({"A": 0, "B": "x"})), "b");
    assert_eq!(render(source, &json!({})), "none");
}

#[test]
fn with_rebinds_dot() {
    let source = "{{with .User}}{{.Name}}{{else}}anonymous{{end}}";
    assert_eq!(render(source, &json!({"User": {"Name": "Ann"}})), "Ann");
    assert_eq!(render(source, &json!({"User": null})), "anonymous");
}

#[test]
fn range_with_break_and_continue() {
    let source = "{{range $i, $e := .L}}\
        {{if eq $e 3}}{{continue}}{{end}}\
        {{if eq $e 5}}{{break}}{{end}}\
        {{$i}}={{$e}} {{end}}";
    let out = render(source, &json!({"L": [1, 2, 3, 4, 5, 6]}));
    assert_eq!(out, "0=1 1=2 3=4 ");
}

#[test]
fn range_over_objects_integers_and_nothing() {
    let out = render("{{range $k, $v := .M}}{{$k}}:{{$v}};{{end}}", &json!({"M": {"b": 2, "a": 1}}));
    assert_eq!(out, "a:1;b:2;");
    assert_eq!(render("{{range 3}}{{.}}{{end}}", &json!({})), "012");
    let source = "{{range .L}}x{{else}}empty{{end}}";
    assert_eq!(render(source, &json!({"L": []})), "empty");
    assert_eq!(render(source, &json!({})), "empty");
}

#[test]
fn range_over_scalar_fails() {
    let err = render_err("{{range .S}}{{end}}", &json!({"S": "abc"}));
    assert!(err.contains("range can't iterate over abc"), "{err}");
}

#[test]
fn variable_assignment_reaches_outer_scope() {
    let out = render("{{$x := 1}}{{if true}}{{$x = 2}}{{end}}{{$x}}", &json!({}));
    assert_eq!(out, "2");
    assert_eq!(render("{{$.A}}{{with .B}}{{$.A}}{{end}}", &json!({"A": "r", "B": 1})), "rr");
}

#[test]
fn define_template_and_block() {
    let source = r#"{{define "row"}}<{{.}}>{{end}}{{range .L}}{{template "row" .}}{{end}}"#;
    assert_eq!(render(source, &json!({"L": ["a", "b"]})), "<a><b>");
    assert_eq!(render(r#"{{block "b" .X}}[{{.}}]{{end}}"#, &json!({"X": 1})), "[1]");
}

#[test]
fn execute_named_template() {
    let tmpl = Template::new("t")
        .parse(r#"{{define "greet"}}hi {{.}}{{end}}main"#)
        .unwrap();
    let mut out = Vec::new();
    tmpl.execute_template(&mut out, "greet", &json!("bob")).unwrap();
    assert_eq!(out, b"hi bob");
}

#[test]
fn recursion_is_bounded() {
    let child = std::thread::Builder::new()
        .stack_size(256 << 20)
        .spawn(|| render_err(r#"{{define "r"}}{{template "r" .}}{{end}}{{template "r" .}}"#, &json!({})))
        .unwrap();
    let err = child.join().unwrap();
    assert!(err.contains("exceeded maximum template depth (1000)"), "{err}");
}

#[test]
fn builtins_in_pipelines() {
    let data = json!({"L": ["a", "b", "c"], "M": {"k": "v"}, "S": "hi"});
    assert_eq!(render("{{len .L}} {{index .L 1}} {{index .M \"k\"}}", &data), "3 b v");
    assert_eq!(render("{{.S | printf \"%s!\"}}", &data), "hi!");
    assert_eq!(render("{{printf \"%d-%s\" 7 .S}}", &data), "7-hi");
    assert_eq!(render("{{printf \"%d\" .S}}", &data), "%!d(string=hi)");
    assert_eq!(render("{{eq 3 1 2 3}} {{lt 1 2.5}} {{not .S}}", &data), "true true false");
    assert_eq!(render("{{or .Missing \"fallback\"}}", &data), "fallback");
}

#[test]
fn printf_rejects_oversized_counts() {
    let out = render(r#"{{printf "%*d" 9223372036854775807 1}}"#, &json!({}));
    assert_eq!(out, "%!(BADWIDTH)1");
    let out = render(r#"{{printf "%.*f|%c" -5 1.5 55296}}"#, &json!({}));
    assert_eq!(out, "%!(BADPREC)1.500000|\u{FFFD}");
}

#[test]
fn and_or_short_circuit() {
    let funcs = FuncMap::new().with("fail", |_: &[Value]| Err(FuncError::new("boom")));
    let tmpl = Template::new("t")
        .funcs(funcs)
        .parse("{{and .A (fail)}} {{or 1 (fail)}}")
        .unwrap();
    assert_eq!(tmpl.render(&json!({"A": false})).unwrap(), "false 1");
}

#[test]
fn user_function_errors_are_reported() {
    let funcs = FuncMap::new().with("fail", |_: &[Value]| Err(FuncError::new("boom")));
    let tmpl = Template::new("t").funcs(funcs).parse("x{{fail}}").unwrap();
    let err = tmpl.render(&json!({})).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"template: t:1: executing "t" at <fail>: error calling fail: boom"#
    );
}

#[test]
fn missing_keys() {
    assert_eq!(render("{{.Nope}}", &json!({})), "<no value>");
    assert_eq!(render("{{.A.B}}", &json!({})), "<no value>");

    let tmpl = Template::new("t")
        .option(MissingKey::Error)
        .parse("{{.Nope}}")
        .unwrap();
    let err = tmpl.render(&json!({})).unwrap_err();
    assert!(matches!(err, ExecError::Eval { line: 1, .. }));
    assert_eq!(
        err.to_string(),
        r#"template: t:1: executing "t" at <.Nope>: map has no entry for key "Nope""#
    );
}

#[test]
fn field_of_scalar_fails() {
    let err = render_err("\n{{.A.B}}", &json!({"A": 5}));
    assert_eq!(
        err,
        r#"template: t:2: executing "t" at <.A.B>: can't evaluate field B in type int"#
    );
}

#[test]
fn parse_errors_surface_from_template() {
    let err = Template::new("t").parse("{{nope}}").unwrap_err();
    assert!(err.to_string().contains(r#"function "nope" not defined"#), "{err}");
    let err = Template::new("t").parse("{{$y}}").unwrap_err();
    assert!(err.to_string().contains(r#"undefined variable "$y""#), "{err}");
}

proptest! {
    #[test]
    fn plain_text_renders_verbatim(text in "[^\\[\\]{}]{0,40}") {
        let tmpl = Template::new("t").delims("[", "]").parse(&text).unwrap();
        prop_assert_eq!(tmpl.render(&json!({})).unwrap(), text);
    }

    #[test]
    fn field_lookup_renders_value(key in "[A-Z][a-z]{0,6}", value in "[a-z0-9 ]{0,10}") {
        let tmpl = Template::new("t")
            .delims("[", "]")
            .parse(&format!("<[.{key}]>"))
            .unwrap();
        let mut data = serde_json::Map::new();
        data.insert(key, Value::String(value.clone()));
        prop_assert_eq!(tmpl.render(&Value::Object(data)).unwrap(), format!("<{value}>"));
    }
}
