#[cfg(test)]
mod tests {
    use rsql::ast::{ComparisonOperator, LogicalOperator, Node, OperatorRegistry};
    use rsql::errors::ErrorKind;
    use rsql::parser::RsqlParser;
    use rsql::visitor::{GroupedMapVisitor, SimpleMapVisitor};
    use rsql::RsqlConfigBuilder;

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let node = rsql::parse("a==1;b==2,c==3").unwrap();
        let or = node.as_logical().unwrap();
        assert_eq!(or.operator(), LogicalOperator::Or);
        assert_eq!(or.len(), 2);

        let and = or.children()[0].as_logical().unwrap();
        assert_eq!(and.operator(), LogicalOperator::And);
        assert_eq!(and.children()[0].as_comparison().unwrap().selector(), "a");
        assert_eq!(or.children()[1].as_comparison().unwrap().selector(), "c");
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let node = rsql::parse("a==1;(b==2,c==3)").unwrap();
        let and = node.as_logical().unwrap();
        assert_eq!(and.operator(), LogicalOperator::And);
        assert_eq!(and.children()[1].as_logical().unwrap().operator(), LogicalOperator::Or);
    }

    #[test]
    fn test_chained_operators_collapse() {
        let node = rsql::parse("a==1;b==2;c==3;d==4").unwrap();
        assert_eq!(node.as_logical().unwrap().len(), 4);
    }

    #[test]
    fn test_quoted_arguments() {
        let node = rsql::parse(r#"name=="John \"JJ\" Doe";title=='it''s'"#);
        // adjacent quoted strings are not concatenated
        assert!(node.is_err());

        let node = rsql::parse(r#"name=="John \"JJ\" Doe";title=='a;b,c'"#).unwrap();
        let and = node.as_logical().unwrap();
        assert_eq!(
            and.children()[0].as_comparison().unwrap().arguments(),
            &["John \"JJ\" Doe".to_string()]
        );
        assert_eq!(
            and.children()[1].as_comparison().unwrap().arguments(),
            &["a;b,c".to_string()]
        );
    }

    #[test]
    fn test_multi_value_arguments() {
        let node = rsql::parse("status=in=(active, 'on hold',pending)").unwrap();
        let comparison = node.as_comparison().unwrap();
        assert!(comparison.operator().is_multi_value());
        assert_eq!(comparison.arguments(), &["active", "on hold", "pending"]);
    }

    #[test]
    fn test_alternate_symbols_resolve_to_same_operator() {
        let short = rsql::parse("age>30").unwrap();
        let long = rsql::parse("age=gt=30").unwrap();
        assert_eq!(short, long);
        assert_eq!(short.to_string(), "age=gt=30");
    }

    #[test]
    fn test_unknown_operator() {
        let err = rsql::parse("name=foo=bar").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnknownOperator("=foo=".to_string()));
    }

    #[test]
    fn test_extended_operators_need_registration() {
        assert!(rsql::parse("email=isnull=true").is_err());

        let config = RsqlConfigBuilder::new().extended_operators().build().unwrap();
        let node = config.parser().parse("email=isnull=true;age=bt=(18,30)").unwrap();
        assert_eq!(node.as_logical().unwrap().len(), 2);
    }

    #[test]
    fn test_custom_operator_registration() {
        let operators = OperatorRegistry::new();
        operators.register(ComparisonOperator::new(&["=all="], true).unwrap());

        let parser = RsqlParser::with_operators(operators);
        let node = parser.parse("tags=all=(a,b)").unwrap();
        assert_eq!(node.as_comparison().unwrap().operator().symbol(), "=all=");
    }

    #[test]
    fn test_single_value_operator_rejects_list() {
        let err = rsql::parse("age==(1,2)").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = rsql::parse("name==john;").unwrap_err();
        match err.kind() {
            ErrorKind::SyntaxError {
                found,
                line,
                column,
                expected,
                ..
            } => {
                assert_eq!(found, "<EOF>");
                assert_eq!(*line, 1);
                assert_eq!(*column, 12);
                assert!(!expected.is_empty());
            }
            other => panic!("unexpected error kind {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            rsql::parse("(a==1;b==2").unwrap_err().kind(),
            ErrorKind::SyntaxError { .. }
        ));
        assert!(matches!(
            rsql::parse("a==1)").unwrap_err().kind(),
            ErrorKind::SyntaxError { .. }
        ));
    }

    #[test]
    fn test_lexical_error() {
        let err = rsql::parse("name==\"open").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::LexicalError { .. } | ErrorKind::SyntaxError { .. }
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(rsql::parse("").is_err());
        assert!(rsql::parse("   ").is_err());
    }

    #[test]
    fn test_max_depth() {
        let filter = format!("{}a==1{}", "(".repeat(10), ")".repeat(10));
        assert!(RsqlParser::new().parse(&filter).is_ok());

        let err = RsqlParser::new().max_depth(5).parse(&filter).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::SyntaxError { .. }));
    }

    #[test]
    fn test_display_round_trip() {
        let filters = [
            "name==john",
            "(a==1;b==2)",
            "((a==1;b==2),c=in=(x,y))",
            "title=='a b'",
            "name==\"it's\"",
        ];
        for filter in filters {
            let node = rsql::parse(filter).unwrap();
            let reparsed = rsql::parse(&node.to_string()).unwrap();
            assert_eq!(node, reparsed, "round trip of {}", filter);
        }
    }

    #[test]
    fn test_nodes_built_programmatically_match_parsed() {
        let registry = OperatorRegistry::new();
        let eq = registry.get("==").unwrap();
        let built = Node::and(vec![
            Node::comparison(eq.clone(), "a", vec!["1".to_string()]).unwrap(),
            Node::comparison(eq, "b", vec!["2".to_string()]).unwrap(),
        ])
        .unwrap();
        assert_eq!(built, rsql::parse("a==1;b==2").unwrap());
    }

    #[test]
    fn test_map_visitors() {
        let node = rsql::parse("age=gt=18;age<65,name==john").unwrap();

        let simple = node.accept_no_arg(&mut SimpleMapVisitor);
        assert_eq!(simple.keys().collect::<Vec<_>>(), vec!["age", "name"]);
        assert_eq!(simple["age"], vec!["18", "65"]);

        let grouped = node.accept_no_arg(&mut GroupedMapVisitor);
        assert_eq!(grouped["age"]["=gt="], vec!["18"]);
        assert_eq!(grouped["age"]["=lt="], vec!["65"]);
        assert_eq!(grouped["name"]["=="], vec!["john"]);
    }
}
