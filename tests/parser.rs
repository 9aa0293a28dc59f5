#[cfg(test)]
mod parser_tests {
    use cmm_interpreter as cmm;

    use cmm::error::InterpError;
    use cmm::node::Node;
    use cmm::parser::*;
    use indoc::indoc;

    /// Render a tree as `token(left, right)` for compact structural checks.
    fn shape(node: &Node) -> String {
        match (node.left(), node.right()) {
            (None, None) => node.lexeme().to_string(),
            (Some(l), None) => format!("{}({})", node.lexeme(), shape(l)),
            (None, Some(r)) => format!("{}(_, {})", node.lexeme(), shape(r)),
            (Some(l), Some(r)) => format!("{}({}, {})", node.lexeme(), shape(l), shape(r)),
        }
    }

    #[test]
    fn test_children_are_two_columns_deeper() {
        let root = parse_ast(indoc! {"
            ;
              ~
                int
                x
              ;
                =
                  x
                  +
                    1
                    2
                return
                  x
        "})
        .unwrap();

        assert_eq!(shape(&root), ";(~(int, x), ;(=(x, +(1, 2)), return(x)))");
    }

    #[test]
    fn test_single_line_is_a_leaf() {
        let root = parse_ast("42").unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.lexeme(), "42");
    }

    #[test]
    fn test_parse_lines_matches_parse_ast() {
        let lines = vec!["-", "  5", "  3"];
        let from_lines = parse_lines(&lines).unwrap();
        let from_text = parse_ast("-\n  5\n  3\n").unwrap();

        assert_eq!(from_lines, from_text);
        assert_eq!(shape(&from_lines), "-(5, 3)");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let root = parse_ast("\n+\n\n  1\n   \n  2\n\n").unwrap();
        assert_eq!(shape(&root), "+(1, 2)");
    }

    #[test]
    fn test_root_may_be_indented() {
        let root = parse_ast("    if\n      1\n      2\n").unwrap();
        assert_eq!(shape(&root), "if(1, 2)");
    }

    #[test]
    fn test_third_child_is_ignored() {
        let root = parse_ast("+\n  1\n  2\n  3\n    4\n").unwrap();
        assert_eq!(shape(&root), "+(1, 2)");
    }

    #[test]
    fn test_lines_after_root_are_ignored() {
        let root = parse_ast("return\n  1\nreturn\n  2\n").unwrap();
        assert_eq!(shape(&root), "return(1)");
    }

    #[test]
    fn test_empty_input_is_rejected() {
        for text in ["", "\n\n", "   \n"] {
            match parse_ast(text) {
                Err(InterpError::InputContract(_)) => {}
                other => panic!("Expected input-contract error for {:?}, got {:?}", text, other),
            }
        }

        let no_lines: Vec<&str> = Vec::new();
        assert!(matches!(
            parse_lines(no_lines),
            Err(InterpError::InputContract(_))
        ));
    }

    #[test]
    fn test_syntax_error_surfaces_full_output() {
        let output = "int main() {\n  return 1\n}\nsyntax error\n";

        match parse_ast(output) {
            Err(InterpError::FrontEnd { output: detail }) => {
                assert_eq!(detail, output);
                assert!(InterpError::FrontEnd { output: detail }.to_string().contains("return 1"));
            }
            other => panic!("Expected front-end error, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_lines_records_indentation() {
        let lines = scan_lines("D\n  d\n    int\n").unwrap();
        let summary: Vec<(usize, usize, &str)> = lines
            .iter()
            .map(|l| (l.number, l.indent, l.lexeme))
            .collect();

        assert_eq!(summary, vec![(1, 0, "D"), (2, 2, "d"), (3, 4, "int")]);
    }
}
