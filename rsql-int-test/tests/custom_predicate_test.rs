use rsql::ast::ComparisonOperator;
use rsql::common::{Value, ValueType};
use rsql::errors::ErrorKind;
use rsql::resolver::{CustomPredicate, FilterExpression};
use rsql_int_test::test_util::{cleanup, create_test_context, run_test};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn operator(symbol: &str, multi_value: bool) -> ComparisonOperator {
    ComparisonOperator::new(&[symbol], multi_value).unwrap()
}

#[test]
fn test_custom_predicate_replaces_builder() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().register_custom_predicate(CustomPredicate::new(
                operator("=len=", false),
                ValueType::I64,
                |leaf| Ok(format!("length({}) = {}", leaf.attribute_path(), leaf.values()[0])),
            ));

            let compiler = ctx.compiler();
            let sql = compiler.compile("name=len=5;age==3", "Person")?;
            assert_eq!(sql, "(length(name) = 5 AND age = 3)");

            // only the regular comparison reached the builder
            let leaves = ctx.builder().leaves();
            assert_eq!(leaves.len(), 1);
            assert_eq!(leaves[0].attribute_path(), "age");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_arguments_use_predicate_type() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().register_custom_predicate(CustomPredicate::new(
                operator("=len=", false),
                ValueType::I64,
                |leaf| {
                    assert_eq!(leaf.value_type(), &ValueType::I64);
                    assert_eq!(leaf.value(), Some(&Value::I64(5)));
                    Ok("ok".to_string())
                },
            ));

            let compiler = ctx.compiler();
            assert_eq!(compiler.compile("name=len=5", "Person")?, "ok");

            let err = compiler.compile("name=len=five", "Person").unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::ConversionError { .. }));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_typed_predicate_preferred() {
    run_test(
        create_test_context,
        |ctx| {
            let config = ctx.config();
            config.register_custom_predicate(CustomPredicate::new(
                operator("=older=", false),
                ValueType::I32,
                |leaf| Ok(format!("{} > {}", leaf.attribute_path(), leaf.values()[0])),
            ));
            config.register_custom_predicate(
                CustomPredicate::new(operator("=older=", false), ValueType::I32, |leaf| {
                    Ok(format!(
                        "{} < now() - {} years",
                        leaf.attribute_path(),
                        leaf.values()[0]
                    ))
                })
                .for_attribute_type(ValueType::Date),
            );

            let compiler = ctx.compiler();
            assert_eq!(
                compiler.compile("birth_date=older=18", "Person")?,
                "birth_date < now() - 18 years"
            );
            assert_eq!(compiler.compile("age=older=18", "Person")?, "age > 18");

            assert!(config.unregister_custom_predicate("=older=", Some(&ValueType::Date)));
            assert_eq!(
                compiler.compile("birth_date=older=18", "Person")?,
                "birth_date > 18"
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_multi_value_custom_operator() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().register_custom_predicate(CustomPredicate::new(
                operator("=all=", true),
                ValueType::String,
                |leaf| {
                    let values: Vec<String> = leaf.values().iter().map(|v| v.to_string()).collect();
                    Ok(format!("{} @> [{}]", leaf.attribute_path(), values.join(", ")))
                },
            ));

            let sql = ctx.compiler().compile("tags=all=(rust,wasm)", "Person")?;
            assert_eq!(sql, "tags @> [\"rust\", \"wasm\"]");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failing_predicate() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().register_custom_predicate(CustomPredicate::<String>::new(
                operator("=geo=", false),
                ValueType::String,
                |_| anyhow::bail!("geo lookups are not supported"),
            ));

            let err = ctx.compiler().compile("address.city=geo=Oslo", "Person").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::PredicateError);
            assert!(err.message().contains("geo lookups are not supported"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_predicate_for_other_condition_type_is_ignored() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().register_custom_predicate(CustomPredicate::new(
                operator("=len=", false),
                ValueType::I64,
                |_| Ok(FilterExpression::Conjunction),
            ));

            // the operator is known, but the String builder handles the comparison
            let sql = ctx.compiler().compile("name=len=5", "Person")?;
            assert_eq!(sql, "name =len= (\"5\")");
            Ok(())
        },
        cleanup,
    )
}
