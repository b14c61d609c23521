use chrono::NaiveDate;
use rsql::common::{Value, ValueType};
use rsql::errors::ErrorKind;
use rsql::resolver::AttributeKind;
use rsql::ConversionFailurePolicy;
use rsql_int_test::test_util::{
    cleanup, create_extended_test_context, create_test_context, run_test,
};
use uuid::Uuid;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_compile_basic_comparisons() {
    run_test(
        create_test_context,
        |ctx| {
            let compiler = ctx.compiler();
            let sql = compiler.compile("name==john;age=gt=30", "Person")?;
            assert_eq!(sql, "(name = \"john\" AND age > 30)");

            let sql = compiler.compile("age>=18,active==true", "Person")?;
            assert_eq!(sql, "(age >= 18 OR active = true)");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_precedence_is_preserved() {
    run_test(
        create_test_context,
        |ctx| {
            let sql = ctx
                .compiler()
                .compile("name==a;age==1,name==b;age==2", "Person")?;
            assert_eq!(
                sql,
                "((name = \"a\" AND age = 1) OR (name = \"b\" AND age = 2))"
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_argument_conversion() {
    run_test(
        create_test_context,
        |ctx| {
            let id = Uuid::new_v4();
            let filter = format!(
                "id=={};birth_date=lt=1990-05-01;status==pending;initial==j;score=le=10",
                id
            );
            ctx.compiler().compile(&filter, "Person")?;

            let leaves = ctx.builder().leaves();
            assert_eq!(leaves.len(), 5);
            assert_eq!(leaves[0].value(), Some(&Value::Uuid(id)));
            assert_eq!(
                leaves[1].value(),
                Some(&Value::Date(NaiveDate::from_ymd_opt(1990, 5, 1).unwrap()))
            );
            assert_eq!(
                leaves[2].value(),
                Some(&Value::Enum {
                    type_name: "Status".to_string(),
                    variant: "Pending".to_string(),
                })
            );
            assert_eq!(leaves[3].value(), Some(&Value::Char('j')));
            assert_eq!(leaves[4].value(), Some(&Value::U64(10)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_offset_date_time_argument() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.compiler()
                .compile("created_at=gt='2024-01-15T10:30:00+02:00'", "Person")?;
            let leaves = ctx.builder().leaves();
            match leaves[0].value() {
                Some(Value::OffsetDateTime(value)) => {
                    assert_eq!(value.to_rfc3339(), "2024-01-15T10:30:00+02:00")
                }
                other => panic!("unexpected value {:?}", other),
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_multi_value_conversion() {
    run_test(
        create_test_context,
        |ctx| {
            let sql = ctx.compiler().compile("age=in=(18,21,30)", "Person")?;
            assert_eq!(sql, "age IN (18, 21, 30)");

            let leaf = &ctx.builder().leaves()[0];
            assert_eq!(
                leaf.values(),
                &[Value::I32(18), Value::I32(21), Value::I32(30)]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_nested_paths() {
    run_test(
        create_test_context,
        |ctx| {
            let compiler = ctx.compiler();
            compiler.compile(
                "address.city==Oslo;friends.address.zipCode==0150;projects.members.name==bob",
                "Person",
            )?;

            let leaves = ctx.builder().leaves();
            assert_eq!(leaves[0].attribute_path(), "address.city");
            assert_eq!(leaves[0].path()[0].attribute().kind(), AttributeKind::Embedded);
            assert_eq!(leaves[0].path()[1].entity(), "Address");

            assert_eq!(leaves[1].attribute_path(), "friends.address.zipCode");
            assert_eq!(leaves[1].path().len(), 3);
            assert!(leaves[1].path()[0].attribute().is_collection());
            assert_eq!(leaves[1].value(), Some(&Value::from("0150")));

            assert_eq!(leaves[2].path()[1].entity(), "Project");
            assert_eq!(leaves[2].path()[2].entity(), "Person");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let compiler = ctx.compiler();
            compiler.compile("tags=in=(rust,java);previous_addresses.city==Rome", "Person")?;

            let leaves = ctx.builder().leaves();
            assert_eq!(leaves[0].value_type(), &ValueType::String);
            assert_eq!(
                leaves[0].path()[0].attribute().kind(),
                AttributeKind::ElementCollection
            );
            assert_eq!(leaves[1].path()[1].entity(), "Address");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unknown_selector() {
    run_test(
        create_test_context,
        |ctx| {
            let compiler = ctx.compiler();

            let err = compiler.compile("height==180", "Person").unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::UnknownSelector {
                    entity: "Person".to_string(),
                    attribute: "height".to_string(),
                }
            );

            let err = compiler.compile("address.planet==earth", "Person").unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::UnknownSelector {
                    entity: "Address".to_string(),
                    attribute: "planet".to_string(),
                }
            );

            // a scalar cannot be traversed
            let err = compiler.compile("name.first==john", "Person").unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::UnknownSelector { .. }));

            // skipped fields are not part of the schema
            let err = compiler.compile("internal_note==x", "Person").unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::UnknownSelector { .. }));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unknown_entity() {
    run_test(
        create_test_context,
        |ctx| {
            let err = ctx.compiler().compile("name==john", "Animal").unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::UnknownSelector { .. }));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_conversion_failure_policies() {
    run_test(
        create_test_context,
        |ctx| {
            let compiler = ctx.compiler();
            let config = ctx.config();

            let err = compiler.compile("age==abc;name==john", "Person").unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::ConversionError {
                    value: "abc".to_string(),
                    value_type: ValueType::I32.to_string(),
                }
            );

            config.set_conversion_failure_policy(ConversionFailurePolicy::Skip);
            assert_eq!(
                compiler.compile("age==abc;name==john", "Person")?,
                "name = \"john\""
            );
            assert_eq!(compiler.compile("age==abc", "Person")?, "1 = 1");

            config.set_conversion_failure_policy(ConversionFailurePolicy::PassNull);
            assert_eq!(compiler.compile("age==abc", "Person")?, "age = null");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_custom_type_needs_converter() {
    run_test(
        create_test_context,
        |ctx| {
            let compiler = ctx.compiler();
            let err = compiler.compile("salary=gt=100EUR", "Person").unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::ConversionError { .. }));

            ctx.config().register_converter(
                ValueType::Custom("Money".to_string()),
                |raw| {
                    let amount = raw.trim_end_matches(|c: char| c.is_ascii_alphabetic());
                    if amount.is_empty() || amount.parse::<f64>().is_err() {
                        anyhow::bail!("'{}' is not an amount", raw);
                    }
                    Ok(Value::Custom {
                        type_name: "Money".to_string(),
                        value: raw.to_string(),
                    })
                },
            );

            assert_eq!(
                compiler.compile("salary=gt=100EUR", "Person")?,
                "salary > Money(100EUR)"
            );
            assert!(compiler.compile("salary=gt=EUR", "Person").is_err());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remapping() {
    run_test(
        create_test_context,
        |ctx| {
            let config = ctx.config();
            config.add_remapping("Person", "city", "address.city");
            config.add_remapping("Person", "born", "birth_date");

            let compiler = ctx.compiler();
            compiler.compile("city==Oslo;born=ge=2000-01-01", "Person")?;

            let leaves = ctx.builder().leaves();
            assert_eq!(leaves[0].selector(), "city");
            assert_eq!(leaves[0].attribute_path(), "address.city");
            assert_eq!(leaves[1].attribute_path(), "birth_date");
            assert_eq!(leaves[1].value_type(), &ValueType::Date);

            assert_eq!(
                config.remove_remapping("Person", "city").as_deref(),
                Some("address.city")
            );
            assert!(compiler.compile("city==Oslo", "Person").is_err());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remapping_inside_nested_entity() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().add_remapping("Address", "zip", "zipCode");
            ctx.compiler().compile("friends.address.zip==0150", "Person")?;
            assert_eq!(
                ctx.builder().leaves()[0].attribute_path(),
                "friends.address.zipCode"
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_self_referencing_remapping_terminates() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().add_remapping("Person", "nick", "friends.nick");
            ctx.config().add_remapping("Person", "friend_city", "friends.address.city");
            let compiler = ctx.compiler();

            let err = compiler.compile("nick==x", "Person").unwrap_err();
            assert_eq!(
                err.kind(),
                &ErrorKind::UnknownSelector {
                    entity: "Person".to_string(),
                    attribute: "nick".to_string(),
                }
            );

            compiler.compile("friend_city==Oslo", "Person")?;
            assert_eq!(
                ctx.builder().leaves()[0].attribute_path(),
                "friends.address.city"
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_extended_operators() {
    run_test(
        create_extended_test_context,
        |ctx| {
            let compiler = ctx.compiler();
            assert_eq!(
                compiler.compile("name=like=jo*", "Person")?,
                "name LIKE \"jo%\""
            );
            assert_eq!(
                compiler.compile("age=bt=(18,30)", "Person")?,
                "age BETWEEN 18 AND 30"
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_schema_cache_is_filled() {
    run_test(
        create_test_context,
        |ctx| {
            let compiler = ctx.compiler();
            compiler.compile("address.city==Oslo", "Person")?;
            assert_eq!(compiler.schema_cache().len(), 2);

            compiler.compile("address.city==Rome;age==3", "Person")?;
            assert_eq!(compiler.schema_cache().len(), 3);
            Ok(())
        },
        cleanup,
    )
}
