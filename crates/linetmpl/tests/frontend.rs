use std::collections::BTreeSet;

use linetmpl::{
    compile, parse, Error, Frontend, FuncError, FuncMap, Node, NodeKind, NodeRef, NodeType,
    Template, Tree,
};
use proptest::prelude::*;
use serde_json::{json, Value};

const PLATE: &str = "/[.Date]/[.Plate]/[.Year]";

fn plate_data() -> Value {
    json!({"Date": "20180201", "Plate": "ABC123", "Year": "2018"})
}

fn types(nodes: &[Node]) -> Vec<NodeType> {
    nodes.iter().map(Node::node_type).collect()
}

fn only_arg(action: &Node) -> &Node {
    let NodeKind::Action { pipe: Some(pipe) } = action.kind() else {
        panic!("not an action: {action:?}");
    };
    let NodeKind::Pipe { cmds, .. } = pipe.kind() else {
        panic!("not a pipe: {pipe:?}");
    };
    let NodeKind::Command { args } = cmds[0].kind() else {
        panic!("not a command: {:?}", cmds[0]);
    };
    &args[0]
}

/// Keys a node object may carry besides `nodeType`, `pos` and `line`.
fn allowed_keys(tag: &str) -> &'static [&'static str] {
    match tag {
        "TEXT" | "NUMBER" | "STRING" => &["text"],
        "ACTION" => &["pipe"],
        "PIPE" => &["isAssign", "decl", "cmds"],
        "COMMAND" => &["args"],
        "VARIABLE" | "FIELD" | "IDENTIFIER" => &["ident"],
        "CHAIN" => &["node", "field"],
        "BOOL" => &["true"],
        "DOT" | "NIL" => &[],
        other => panic!("unknown tag {other}"),
    }
}

/// Check every node object in `value` against its tag; return how many were seen.
fn check_tag_fields(value: &Value) -> usize {
    let object = value.as_object().expect("node is an object");
    let tag = object["nodeType"].as_str().expect("nodeType is a string");
    let mut expected: BTreeSet<&str> = allowed_keys(tag).iter().copied().collect();
    if tag == "CHAIN" && !object.contains_key("node") {
        expected.remove("node");
    }
    expected.extend(["nodeType", "pos", "line"]);
    let actual: BTreeSet<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(actual, expected, "fields of {value}");

    let mut count = 1;
    for key in ["pipe", "node"] {
        if let Some(child) = object.get(key) {
            count += check_tag_fields(child);
        }
    }
    for key in ["decl", "cmds", "args"] {
        if let Some(children) = object.get(key).and_then(Value::as_array) {
            count += children.iter().map(check_tag_fields).sum::<usize>();
        }
    }
    count
}

#[test]
fn plate_template_parses_to_text_and_actions() {
    let tree = parse("plate", PLATE).unwrap();
    assert_eq!(tree.name, "plate");
    assert_eq!(
        types(&tree.nodes),
        vec![
            NodeType::Text,
            NodeType::Action,
            NodeType::Text,
            NodeType::Action,
            NodeType::Text,
            NodeType::Action,
        ]
    );
    let fields: Vec<_> = tree
        .nodes
        .iter()
        .filter(|node| node.node_type() == NodeType::Action)
        .map(|action| match only_arg(action).kind() {
            NodeKind::Field { ident } => ident.join("."),
            other => panic!("expected a field, got {other:?}"),
        })
        .collect();
    assert_eq!(fields, vec!["Date", "Plate", "Year"]);
}

#[test]
fn plate_template_executes() {
    let tmpl = compile("plate", PLATE).unwrap();
    assert_eq!(tmpl.render(&plate_data()).unwrap(), "/20180201/ABC123/2018");
}

#[test]
fn compiled_output_matches_default_delimiters() {
    let sources = [
        (
            "[$d := .Date][printf \"%s-%s\" $d .Plate] [.Year | len]",
            "{{$d := .Date}}{{printf \"%s-%s\" $d .Plate}} {{.Year | len}}",
        ),
        (PLATE, "/{{.Date}}/{{.Plate}}/{{.Year}}"),
        ("[/* note */][.Missing]", "{{/* note */}}{{.Missing}}"),
    ];
    for (square, braces) in sources {
        let compiled = compile("t", square).unwrap().render(&plate_data()).unwrap();
        let reference = Template::new("t").parse(braces).unwrap().render(&plate_data()).unwrap();
        assert_eq!(compiled, reference, "{square}");
    }
}

#[test]
fn unicode_plate_template() {
    let source = "/[.日期]/[.车牌]/[.年]/[.月]/[.日]/[.违法代码]_[.序号].jpg";
    let tree = parse("plate", source).unwrap();
    assert_eq!(tree.nodes.len(), 15);
    assert_eq!(tree.nodes[14].kind(), &NodeKind::Text { text: ".jpg".to_string() });

    let data = json!({
        "日期": "20180201", "车牌": "ABC123", "年": "2018", "月": "02", "日": "01",
        "违法代码": "1625", "序号": 3,
    });
    let out = compile("plate", source).unwrap().render(&data).unwrap();
    assert_eq!(out, "/20180201/ABC123/2018/02/01/1625_3.jpg");
}

#[test]
fn chain_keeps_base_and_path() {
    let tree = parse("t", "[.A.B.C]").unwrap();
    let NodeKind::Chain { node: Some(base), field } = only_arg(&tree.nodes[0]).kind() else {
        panic!("expected a chain: {tree:?}");
    };
    assert_eq!(field, &["B", "C"]);
    assert_eq!(base.kind(), &NodeKind::Field { ident: vec!["A".to_string()] });
}

#[test]
fn variable_paths_and_declarations() {
    let tree = parse("t", "[$x := .A][$x.B.C]").unwrap();
    let NodeKind::Action { pipe: Some(pipe) } = tree.nodes[0].kind() else {
        panic!("expected an action");
    };
    let NodeKind::Pipe { is_assign, decl, cmds } = pipe.kind() else {
        panic!("expected a pipe");
    };
    assert!(!is_assign);
    assert_eq!(decl[0].kind(), &NodeKind::Variable { ident: vec!["$x".to_string()] });
    assert_eq!(cmds.len(), 1);

    assert_eq!(
        only_arg(&tree.nodes[1]).kind(),
        &NodeKind::Variable {
            ident: vec!["$x".to_string(), "B".to_string(), "C".to_string()]
        }
    );
}

#[test]
fn command_arguments_keep_order() {
    let tree = parse("t", r#"[printf "%v %v %v" true 1.5 nil . $]"#).unwrap();
    let NodeKind::Action { pipe: Some(pipe) } = tree.nodes[0].kind() else {
        panic!("expected an action");
    };
    let NodeKind::Pipe { cmds, .. } = pipe.kind() else {
        panic!("expected a pipe");
    };
    let NodeKind::Command { args } = cmds[0].kind() else {
        panic!("expected a command");
    };
    assert_eq!(
        types(args),
        vec![
            NodeType::Identifier,
            NodeType::String,
            NodeType::Bool,
            NodeType::Number,
            NodeType::Nil,
            NodeType::Dot,
            NodeType::Variable,
        ]
    );
    assert_eq!(args[0].kind(), &NodeKind::Identifier { ident: vec!["printf".to_string()] });
    assert_eq!(args[1].kind(), &NodeKind::String { text: "%v %v %v".to_string() });
    assert_eq!(args[3].kind(), &NodeKind::Number { text: "1.5".to_string() });
}

#[test]
fn integer_literals_at_the_limits() {
    for literal in ["-9223372036854775808", "0x8000000000000000", "18446744073709551615"] {
        let tree = parse("t", &format!("[{literal}]")).unwrap();
        assert_eq!(only_arg(&tree.nodes[0]).kind(), &NodeKind::Number { text: literal.to_string() });
    }

    let out = compile("t", "[-9223372036854775808] [0x8000000000000000]")
        .unwrap()
        .render(&json!({}))
        .unwrap();
    assert_eq!(out, "-9223372036854775808 9223372036854775808");
}

#[test]
fn comments_are_elided() {
    let tree = parse("t", "a[/* one */]b[- /* two */ -] c").unwrap();
    assert_eq!(types(&tree.nodes), vec![NodeType::Text, NodeType::Text, NodeType::Text]);
    assert_eq!(tree.nodes[2].kind(), &NodeKind::Text { text: "c".to_string() });
}

#[test]
fn unsupported_constructs_are_errors() {
    for source in [
        "[if .A]x[end]",
        "[range .L]x[end]",
        "[with .A]x[else]y[end]",
        r#"[define "x"]y[end][template "x"]"#,
    ] {
        let err = parse("t", source).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)), "{source}: {err}");
    }
}

#[test]
fn grammar_errors_pass_through() {
    let err = parse("t", "x\n[.A").unwrap_err();
    let Error::Syntax(syntax) = &err else {
        panic!("expected a syntax error, got {err}");
    };
    assert_eq!(syntax.line, 2);
    assert_eq!(err.to_string(), syntax.to_string());

    let err = parse("t", "[shout .A]").unwrap_err();
    assert!(err.to_string().contains(r#"function "shout" not defined"#), "{err}");
    assert!(compile("t", "[shout .A]").is_err());
}

#[test]
fn default_braces_are_plain_text() {
    let tree = parse("t", "{{.A}}").unwrap();
    assert_eq!(tree.nodes.len(), 1);
    assert_eq!(tree.nodes[0].kind(), &NodeKind::Text { text: "{{.A}}".to_string() });
    let out = compile("t", "{{.A}}").unwrap().render(&json!({"A": 1})).unwrap();
    assert_eq!(out, "{{.A}}");
}

#[test]
fn custom_function_table() {
    let funcs = FuncMap::new().with("shout", |args: &[Value]| match args {
        [Value::String(s)] => Ok(json!(s.to_uppercase())),
        _ => Err(FuncError::new("shout wants one string")),
    });
    let frontend = Frontend::new(funcs);
    assert!(frontend.funcs().get("shout").is_some());

    let tree = frontend.parse("t", "[.A | shout]").unwrap();
    let NodeKind::Action { pipe: Some(pipe) } = tree.nodes[0].kind() else {
        panic!("expected an action");
    };
    assert_eq!(pipe.children().len(), 2);

    let tmpl = frontend.compile("t", "[.A | shout]!").unwrap();
    assert_eq!(tmpl.render(&json!({"A": "hey"})).unwrap(), "HEY!");
}

#[test]
fn parse_with_visitor_rejection() {
    let frontend = Frontend::default();
    let err = frontend
        .parse_with("t", "[.Secret] [.Name]", &mut |source: NodeRef<'_>, _: &mut Node| match source {
            NodeRef::Field(field) if field.ident[0] == "Secret" => Err(format!("field {} is not allowed", field.ident[0])),
            _ => Ok(()),
        })
        .unwrap_err();
    assert_eq!(err.into_visitor().as_deref(), Some("field Secret is not allowed"));
}

#[test]
fn wire_shape() {
    let tree = parse("t", "a[.B true]").unwrap();
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "name": "t",
            "nodes": [
                {"nodeType": "TEXT", "text": "a", "pos": 0, "line": 1},
                {
                    "nodeType": "ACTION",
                    "pipe": {
                        "nodeType": "PIPE",
                        "isAssign": false,
                        "decl": [],
                        "cmds": [{
                            "nodeType": "COMMAND",
                            "args": [
                                {"nodeType": "FIELD", "ident": ["B"], "pos": 2, "line": 1},
                                {"nodeType": "BOOL", "true": true, "pos": 5, "line": 1},
                            ],
                            "pos": 2,
                            "line": 1,
                        }],
                        "pos": 2,
                        "line": 1,
                    },
                    "pos": 2,
                    "line": 1,
                },
            ],
        })
    );
}

#[test]
fn wire_snapshot() {
    let tree = parse("plate", "/[.Date]").unwrap();
    insta::assert_snapshot!(serde_json::to_string_pretty(&tree).unwrap(), @r#"
    {
      "name": "plate",
      "nodes": [
        {
          "nodeType": "TEXT",
          "text": "/",
          "pos": 0,
          "line": 1
        },
        {
          "nodeType": "ACTION",
          "pipe": {
            "nodeType": "PIPE",
            "isAssign": false,
            "decl": [],
            "cmds": [
              {
                "nodeType": "COMMAND",
                "args": [
                  {
                    "nodeType": "FIELD",
                    "ident": [
                      "Date"
                    ],
                    "pos": 2,
                    "line": 1
                  }
                ],
                "pos": 2,
                "line": 1
              }
            ],
            "pos": 2,
            "line": 1
          },
          "pos": 2,
          "line": 1
        }
      ]
    }
    "#);
}

#[test]
fn trees_deserialize_from_wire_shape() {
    let tree = parse("t", "[$x := (.A).B][$x | printf \"%q\"] tail").unwrap();
    let text = serde_json::to_string(&tree).unwrap();
    let back: Tree = serde_json::from_str(&text).unwrap();
    assert_eq!(back, tree);

    let minimal: Tree = serde_json::from_value(json!({
        "name": "m",
        "nodes": [{"nodeType": "DOT", "pos": 4}],
    }))
    .unwrap();
    assert_eq!(minimal.nodes[0].kind(), &NodeKind::Dot);
    assert_eq!(minimal.nodes[0].line, None);
}

#[test]
fn every_node_follows_its_tag() {
    let tree = parse(
        "t",
        r#"x[$v := .A.B][$v = 2][printf "%d" (len .L) | print][(.M).N][nil | print]["s"][true]"#,
    )
    .unwrap();
    let value = serde_json::to_value(&tree).unwrap();
    let total: usize = value["nodes"].as_array().unwrap().iter().map(check_tag_fields).sum();
    assert!(total > 20, "only {total} nodes");
}

fn action_strategy() -> impl Strategy<Value = String> {
    let name = "[A-Z][a-z]{0,4}";
    prop_oneof![
        name.prop_map(|n| format!(".{n}")),
        (name, name).prop_map(|(a, b)| format!(".{a}.{b}")),
        (name, name).prop_map(|(a, b)| format!("(.{a}).{b}")),
        name.prop_map(|n| format!("$v := .{n}")),
        name.prop_map(|n| format!("printf \"%v\" .{n}")),
        name.prop_map(|n| format!(".{n} | print")),
        (0i64..1000).prop_map(|n| format!("print {n}")),
        "[a-z ]{0,6}".prop_map(|s| format!("print {s:?}")),
        Just("$".to_string()),
        Just("print nil true".to_string()),
    ]
}

fn template_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec(("[a-z/ _.-]{1,8}", action_strategy()), 0..8)
}

proptest! {
    #[test]
    fn supported_templates_parse_completely(pieces in template_strategy()) {
        let source: String = pieces.iter().map(|(text, action)| format!("{text}[{action}]")).collect();
        let tree = parse("t", &source).unwrap();
        prop_assert_eq!(tree.nodes.len(), pieces.len() * 2);
        for (pair, (text, _)) in tree.nodes.chunks(2).zip(&pieces) {
            prop_assert_eq!(pair[0].kind(), &NodeKind::Text { text: text.clone() });
            prop_assert_eq!(pair[1].node_type(), NodeType::Action);
        }
        let positions: Vec<usize> = tree.nodes.iter().map(|node| node.pos).collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let value = serde_json::to_value(&tree).unwrap();
        for node in value["nodes"].as_array().unwrap() {
            check_tag_fields(node);
        }
    }
}
