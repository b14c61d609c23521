use rsql::errors::ErrorKind;
use rsql::{RsqlCompiler, RsqlConfigBuilder};
use rsql_int_test::test_util::{
    cleanup, create_test_context, run_test, sample_schema, RecordingBuilder,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn access_denied(entity: &str, attribute: &str) -> ErrorKind {
    ErrorKind::AccessDenied {
        entity: entity.to_string(),
        attribute: attribute.to_string(),
    }
}

#[test]
fn test_blacklist() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().blacklist("Person", &["password"]);
            let compiler = ctx.compiler();

            let err = compiler.compile("name==x;password==secret", "Person").unwrap_err();
            assert_eq!(err.kind(), &access_denied("Person", "password"));

            // the denied comparison is rejected before anything is built
            assert_eq!(ctx.builder().leaves().len(), 1);
            assert!(compiler.compile("name==x", "Person").is_ok());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_whitelist() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().whitelist("Person", &["name", "address"]);
            let compiler = ctx.compiler();

            assert!(compiler.compile("name==x;address.city==Oslo", "Person").is_ok());
            let err = compiler.compile("age==3", "Person").unwrap_err();
            assert_eq!(err.kind(), &access_denied("Person", "age"));

            ctx.config().clear_whitelist("Person");
            assert!(compiler.compile("age==3", "Person").is_ok());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_access_lists_apply_per_entity() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.config().blacklist("Address", &["zipCode"]);
            let compiler = ctx.compiler();

            let err = compiler.compile("address.zipCode==0150", "Person").unwrap_err();
            assert_eq!(err.kind(), &access_denied("Address", "zipCode"));

            let err = compiler
                .compile("friends.address.zipCode==0150", "Person")
                .unwrap_err();
            assert_eq!(err.kind(), &access_denied("Address", "zipCode"));

            assert!(compiler.compile("address.city==Oslo", "Person").is_ok());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remapping_cannot_bypass_blacklist() {
    run_test(
        create_test_context,
        |ctx| {
            let config = ctx.config();
            config.blacklist("Person", &["password"]);
            config.add_remapping("Person", "pwd", "password");

            let err = ctx.compiler().compile("pwd==secret", "Person").unwrap_err();
            assert_eq!(err.kind(), &access_denied("Person", "password"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_blacklist_wins_over_whitelist() {
    let config = RsqlConfigBuilder::new()
        .whitelist("Person", &["name", "email"])
        .blacklist("Person", &["email"])
        .build()
        .unwrap();
    assert!(config.is_allowed("Person", "name"));
    assert!(!config.is_allowed("Person", "email"));
    assert!(!config.is_allowed("Person", "age"));
    assert!(config.is_allowed("Address", "city"));

    let compiler = RsqlCompiler::new(config, sample_schema(), RecordingBuilder::new());
    let err = compiler.compile("email==a@b.c", "Person").unwrap_err();
    assert_eq!(err.kind(), &access_denied("Person", "email"));
}
