use chrono::{DateTime, FixedOffset, NaiveDate};
use parking_lot::Mutex;
use rsql::errors::RsqlResult;
use rsql::resolver::{PredicateBuilder, ResolvedLeaf, SchemaRegistry};
use rsql::{RsqlCompiler, RsqlConfig};
use rsql_derive::{RsqlEntity, RsqlEnum};
use std::backtrace::Backtrace;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Runs a test between a setup and a teardown step, reporting failures and
/// panics with the elapsed time and a backtrace.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> RsqlResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> RsqlResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> RsqlResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx).map_err(|e| {
                    (format!("After run failed: {:?}", e), backtrace.to_string())
                }),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", panic_err.type_id())
            };
            (
                format!("Panic: {}", err_msg),
                Backtrace::capture().to_string(),
            )
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed. Error: {}", error);
}

#[derive(RsqlEnum)]
pub enum Status {
    Active,
    Pending,
    #[rsql(rename = "CLOSED")]
    Closed,
}

#[derive(RsqlEntity)]
pub struct Address {
    pub street: String,
    pub city: String,
    #[rsql(rename = "zipCode")]
    pub zip_code: String,
    #[rsql(association)]
    pub country: Option<Country>,
}

#[derive(RsqlEntity)]
pub struct Country {
    pub code: String,
    pub name: String,
}

#[derive(RsqlEntity)]
pub struct Project {
    pub title: String,
    pub budget: f64,
    #[rsql(association)]
    pub members: Vec<Person>,
}

#[derive(RsqlEntity)]
#[rsql(name = "Person")]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub email: Option<String>,
    pub active: bool,
    pub initial: char,
    pub score: u64,
    #[rsql(enumeration)]
    pub status: Status,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<FixedOffset>,
    #[rsql(value_type = "Money")]
    pub salary: String,
    pub password: String,
    #[rsql(embedded)]
    pub address: Address,
    #[rsql(embedded)]
    pub previous_addresses: Vec<Address>,
    #[rsql(association)]
    pub friends: Vec<Person>,
    #[rsql(association)]
    pub projects: Vec<Project>,
    pub tags: Vec<String>,
    #[rsql(skip)]
    pub internal_note: String,
}

/// A [PredicateBuilder] rendering SQL-like text and recording every leaf it
/// was asked to build.
#[derive(Clone, Default)]
pub struct RecordingBuilder {
    leaves: Arc<Mutex<Vec<ResolvedLeaf>>>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        RecordingBuilder::default()
    }

    pub fn leaves(&self) -> Vec<ResolvedLeaf> {
        self.leaves.lock().clone()
    }

    pub fn clear(&self) {
        self.leaves.lock().clear();
    }
}

impl PredicateBuilder for RecordingBuilder {
    type Condition = String;

    fn build_leaf(&self, leaf: &ResolvedLeaf) -> RsqlResult<String> {
        self.leaves.lock().push(leaf.clone());

        let column = leaf.attribute_path();
        let values: Vec<String> = leaf.values().iter().map(|v| v.to_string()).collect();
        let condition = match leaf.operator().symbol() {
            "==" => format!("{} = {}", column, values[0]),
            "!=" => format!("{} <> {}", column, values[0]),
            "=gt=" => format!("{} > {}", column, values[0]),
            "=ge=" => format!("{} >= {}", column, values[0]),
            "=lt=" => format!("{} < {}", column, values[0]),
            "=le=" => format!("{} <= {}", column, values[0]),
            "=in=" => format!("{} IN ({})", column, values.join(", ")),
            "=out=" => format!("{} NOT IN ({})", column, values.join(", ")),
            "=bt=" => format!("{} BETWEEN {} AND {}", column, values[0], values[values.len() - 1]),
            "=like=" => format!("{} LIKE {}", column, values[0].replace('*', "%")),
            other => format!("{} {} ({})", column, other, values.join(", ")),
        };
        Ok(condition)
    }

    fn and(&self, left: String, right: String) -> String {
        format!("({} AND {})", left, right)
    }

    fn or(&self, left: String, right: String) -> String {
        format!("({} OR {})", left, right)
    }

    fn conjunction(&self) -> String {
        "1 = 1".to_string()
    }
}

#[derive(Clone)]
pub struct TestContext {
    config: RsqlConfig,
    schema: SchemaRegistry,
    builder: RecordingBuilder,
    compiler: Arc<RsqlCompiler<RecordingBuilder>>,
}

impl TestContext {
    pub fn new(config: RsqlConfig, schema: SchemaRegistry) -> Self {
        let builder = RecordingBuilder::new();
        let compiler = RsqlCompiler::new(config.clone(), schema.clone(), builder.clone());
        TestContext {
            config,
            schema,
            builder,
            compiler: Arc::new(compiler),
        }
    }

    pub fn config(&self) -> &RsqlConfig {
        &self.config
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn builder(&self) -> &RecordingBuilder {
        &self.builder
    }

    pub fn compiler(&self) -> Arc<RsqlCompiler<RecordingBuilder>> {
        self.compiler.clone()
    }
}

/// The sample schema: `Person` and everything reachable from it.
pub fn sample_schema() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry.register_entity::<Person>();
    registry
}

pub fn create_test_context() -> RsqlResult<TestContext> {
    Ok(TestContext::new(RsqlConfig::new(), sample_schema()))
}

pub fn create_extended_test_context() -> RsqlResult<TestContext> {
    let config = rsql::RsqlConfigBuilder::new().extended_operators().build()?;
    Ok(TestContext::new(config, sample_schema()))
}

pub fn cleanup(ctx: TestContext) -> RsqlResult<()> {
    ctx.builder().clear();
    ctx.compiler().schema_cache().clear();
    Ok(())
}
