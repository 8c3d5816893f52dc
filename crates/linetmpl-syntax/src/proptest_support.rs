//! Property-based testing support with arbitrary generators.
//!
//! Strategies here produce template source that the parser accepts, so the
//! properties can check parser and formatter invariants.

use proptest::prelude::*;

use crate::lexer::Delims;
use crate::parser::Parser;
use crate::tree::Node;

fn funcs(name: &str) -> bool {
    matches!(name, "len" | "printf" | "upper")
}

/// Generate a field name; includes non-ASCII letters.
fn field_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z][a-zA-Z0-9_]{0,8}",
        "[日期车牌年份]{1,3}",
    ]
}

/// Generate literal text that never contains a delimiter.
fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 /,_-]{1,12}"
}

/// Generate an operand that can start a pipeline.
fn operand_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(".".to_string()),
        proptest::collection::vec(field_name_strategy(), 1..4)
            .prop_map(|names| format!(".{}", names.join("."))),
        (0..10_000i64).prop_map(|n| n.to_string()),
        "[a-z]{0,6}".prop_map(|s| format!("{s:?}")),
        any::<bool>().prop_map(|b| b.to_string()),
    ]
}

/// Generate a pipeline: an operand, optionally piped through functions.
fn pipeline_strategy() -> impl Strategy<Value = String> {
    (
        operand_strategy(),
        proptest::collection::vec(prop_oneof![Just("len"), Just("upper")], 0..3),
    )
        .prop_map(|(operand, stages)| {
            let mut pipeline = operand;
            for stage in stages {
                pipeline.push_str(" | ");
                pipeline.push_str(stage);
            }
            pipeline
        })
}

/// Generate one piece of a template: text, an action or a comment.
fn piece_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => text_strategy(),
        3 => pipeline_strategy().prop_map(|p| format!("{{{{{p}}}}}")),
        1 => pipeline_strategy().prop_map(|p| format!("{{{{printf \"%v\" ({p})}}}}")),
        1 => "[a-z ]{0,8}".prop_map(|c| format!("{{{{/*{c}*/}}}}")),
    ]
}

/// Generate a template that uses the default delimiters.
pub fn arb_template() -> impl Strategy<Value = String> {
    proptest::collection::vec(piece_strategy(), 0..8).prop_map(|pieces| pieces.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        let trees = Parser::parse("t", source, &Delims::default(), &funcs).unwrap();
        trees["t"].root.to_string()
    }

    proptest! {
        /// Generated templates always parse.
        #[test]
        fn generated_templates_parse(source in arb_template()) {
            let result = Parser::parse("t", &source, &Delims::default(), &funcs);
            prop_assert!(result.is_ok(), "failed to parse {:?}: {:?}", source, result);
        }

        /// Arbitrary input never panics the parser.
        #[test]
        fn parse_never_panics(source in "\\PC{0,40}") {
            let _ = Parser::parse("t", &source, &Delims::new("[", "]"), &funcs);
        }

        /// Formatting a parsed template yields a fixed point.
        #[test]
        fn format_is_idempotent(source in arb_template()) {
            let first = render(&source);
            let second = render(&first);
            prop_assert_eq!(first, second);
        }

        /// Switching delimiters changes nothing but the delimiters.
        #[test]
        fn delimiters_do_not_change_the_tree(source in arb_template()) {
            let bracketed = source.replace("{{", "[").replace("}}", "]");
            let braces = Parser::parse("t", &source, &Delims::default(), &funcs).unwrap();
            let brackets = Parser::parse("t", &bracketed, &Delims::new("[", "]"), &funcs).unwrap();
            let kinds = |nodes: &[Node]| nodes.iter().map(Node::kind_name).collect::<Vec<_>>();
            prop_assert_eq!(kinds(&braces["t"].root.nodes), kinds(&brackets["t"].root.nodes));
            prop_assert_eq!(braces["t"].root.to_string(), brackets["t"].root.to_string());
        }
    }
}
