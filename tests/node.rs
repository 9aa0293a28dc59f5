#[cfg(test)]
mod node_tests {
    use cmm_interpreter as cmm;

    use cmm::node::{Node, Param};
    use cmm::parser::parse_ast;
    use indoc::indoc;

    const EXAMPLE: &str = indoc! {"
        D
          d
            int
            F
              example
          return
            5
    "};

    const ADD: &str = indoc! {"
        D
          d
            int
            F
              add
              ,
                ~
                  int
                  a
                ~
                  int
                  b
          return
            +
              a
              b
    "};

    fn lexemes<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<&'a str> {
        nodes.map(Node::lexeme).collect()
    }

    #[test]
    fn test_return_type() {
        let node = parse_ast(EXAMPLE).unwrap();
        assert_eq!(node.return_type().map(|t| t.lexeme()), Some("int"));

        // Non function nodes have no return type
        let node = parse_ast("+").unwrap();
        assert!(node.return_type().is_none());
    }

    #[test]
    fn test_function_name() {
        let node = parse_ast(EXAMPLE).unwrap();
        assert_eq!(node.function_name().map(|t| t.lexeme()), Some("example"));
    }

    #[test]
    fn test_has_branches() {
        let head = parse_ast("+\n  1\n  2\n").unwrap();
        assert!(head.has_branches());

        let head = parse_ast("return\n  0\n").unwrap();
        assert!(!head.has_branches());
        assert!(!head.is_leaf());
        assert!(head.left().unwrap().is_leaf());
    }

    #[test]
    fn test_is_func() {
        assert!(parse_ast(EXAMPLE).unwrap().is_function_definition());
        assert!(!parse_ast("+").unwrap().is_function_definition());
    }

    #[test]
    fn test_func_params() {
        let node = parse_ast(ADD).unwrap();
        assert_eq!(
            node.func_params(),
            vec![Param::new("int", "a"), Param::new("int", "b")]
        );

        // No parameter subtree
        assert!(parse_ast(EXAMPLE).unwrap().func_params().is_empty());
        assert!(parse_ast("+").unwrap().func_params().is_empty());
    }

    #[test]
    fn test_func_args_flatten_left_to_right() {
        let args = parse_ast(indoc! {"
            ,
              ,
                a
                b
              ,
                +
                  c
                  1
                d
        "})
        .unwrap();

        assert_eq!(lexemes(args.func_args()), vec!["a", "b", "+", "d"]);

        let single = Node::leaf("x");
        assert_eq!(lexemes(single.func_args()), vec!["x"]);
    }

    #[test]
    fn test_preorder() {
        let node = parse_ast("+\n  1\n  *\n    2\n    3\n").unwrap();
        assert_eq!(lexemes(node.iter()), vec!["+", "1", "*", "2", "3"]);
    }

    #[test]
    fn test_str() {
        assert_eq!(parse_ast("D").unwrap().to_string(), "D");
    }

    #[test]
    fn test_serialize_skips_missing_children() {
        let node = parse_ast("return\n  0\n").unwrap();
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"token":"return","left":{"token":"0"}}"#);
    }
}
