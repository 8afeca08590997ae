//! Focused unit tests covering CLI configuration and command execution.

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::commands::{
    ARG_BASE_URL, ARG_TABLE, COUNT_ENV, DESCRIBE_ENV, FIND_ENV, QueryConfig, ServiceConfig,
    TransportBuilder, count_config_from_layers_for_test,
};
use rstest::rstest;
use serde_json::{Value, json};
use tabula_core::HttpMethod;
use tabula_http::test_support::StubTransport;

struct StubBuilder(Arc<StubTransport>);

impl TransportBuilder for StubBuilder {
    type Output = Arc<StubTransport>;

    fn build(&self, _config: &ServiceConfig) -> Result<Self::Output, CliError> {
        Ok(Arc::clone(&self.0))
    }
}

fn service(table: &str) -> ServiceConfig {
    ServiceConfig {
        base_url: "https://api.example.com/app/key".into(),
        table: table.into(),
        timeout: None,
    }
}

#[rstest]
#[case(None, Some("Person".to_owned()), ARG_BASE_URL, DESCRIBE_ENV.base_url)]
#[case(Some("https://api.example.com".to_owned()), None, ARG_TABLE, DESCRIBE_ENV.table)]
#[case(Some("https://api.example.com".to_owned()), Some(String::new()), ARG_TABLE, DESCRIBE_ENV.table)]
fn describe_without_required_fields_errors(
    #[case] base_url: Option<String>,
    #[case] table: Option<String>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = DescribeArgs {
        base_url,
        table,
        ..DescribeArgs::default()
    };
    let err = ServiceConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn count_and_find_name_their_own_environment() {
    let count = QueryConfig::try_from(CountArgs::default()).expect_err("base url missing");
    let find = QueryConfig::try_from(FindArgs::default()).expect_err("base url missing");
    assert!(matches!(count, CliError::MissingArgument { env, .. } if env == COUNT_ENV.base_url));
    assert!(matches!(find, CliError::MissingArgument { env, .. } if env == FIND_ENV.base_url));
}

#[rstest]
fn find_args_build_the_query() {
    let args = FindArgs {
        table: Some("Person".into()),
        base_url: Some("https://api.example.com/app/key".into()),
        timeout_secs: Some(5),
        where_clause: Some("age > 5".into()),
        sort_by: Some("name, age DESC,".into()),
        related: Some("friends".into()),
        page_size: Some(20),
        offset: Some(40),
    };
    let config = QueryConfig::try_from(args).expect("config should build");
    assert_eq!(config.service.timeout, Some(Duration::from_secs(5)));
    assert_eq!(config.query.where_clause(), Some("age > 5"));
    assert_eq!(
        config.query.sort_by(),
        Some(&["name".to_owned(), "age DESC".to_owned()][..])
    );
    assert_eq!(config.query.related(), Some(&["friends".to_owned()][..]));
    assert_eq!(config.query.page_size(), Some(20));
    assert_eq!(config.query.offset(), Some(40));
}

#[rstest]
fn timeout_reaches_the_transport_config() {
    let mut config = service("Person");
    assert_eq!(
        config.transport_config().timeout,
        tabula_http::TransportConfig::default().timeout
    );
    config.timeout = Some(Duration::from_secs(3));
    assert_eq!(config.transport_config().timeout, Duration::from_secs(3));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "table": 42 }));

    let err = count_config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "base_url": "https://from-file.example.com",
            "table": "FromFile",
            "where_clause": "age > 1",
        }),
        None,
    );
    composer.push_environment(json!({
        "table": "FromEnv",
    }));
    composer.push_cli(json!({
        "where_clause": "age > 9",
    }));

    let config =
        count_config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.service.base_url, "https://from-file.example.com");
    assert_eq!(config.service.table, "FromEnv");
    assert_eq!(config.query.where_clause(), Some("age > 9"));
}

#[rstest]
fn count_prints_the_number() {
    let stub = Arc::new(StubTransport::new().with_body(200, "7"));
    let operation = Operation::Count(QueryConfig {
        service: service("Person"),
        query: tabula_core::DataQueryBuilder::new().with_where_clause("age > 5"),
    });

    let output = execute(&operation, &StubBuilder(Arc::clone(&stub))).expect("count");

    assert_eq!(output, json!(7));
    let request = stub.last_request().expect("request sent");
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.path, "data/Person/count?where=age%20%3E%205");
}

#[rstest]
fn find_prints_the_objects() {
    let stub = Arc::new(StubTransport::new().with_json(200, json!([{"name": "Ada"}])));
    let operation = Operation::Find(QueryConfig {
        service: service("Person"),
        query: tabula_core::DataQueryBuilder::new().with_page_size(20),
    });

    let output = execute(&operation, &StubBuilder(Arc::clone(&stub))).expect("find");

    assert_eq!(output, json!([{"name": "Ada"}]));
    let request = stub.last_request().expect("request sent");
    assert_eq!(request.path, "data/Person/find");
    assert_eq!(request.body, Some(json!({"pageSize": 20})));
}

#[rstest]
fn describe_prints_the_schema() {
    let stub = Arc::new(StubTransport::new().with_json(
        200,
        json!([{"name": "objectId", "type": "STRING_ID", "isPrimaryKey": true}]),
    ));
    let operation = Operation::Describe(service("BackendlessUser"));

    let output = execute(&operation, &StubBuilder(Arc::clone(&stub))).expect("describe");

    assert_eq!(output[0]["name"], "objectId");
    assert_eq!(output[0]["type"], "STRING_ID");
    assert_eq!(output[0]["isPrimaryKey"], true);
    let request = stub.last_request().expect("request sent");
    assert_eq!(request.path, "data/Users/properties");
}

#[rstest]
fn service_faults_surface_as_persistence_errors() {
    let stub = Arc::new(
        StubTransport::new().with_json(404, json!({"code": 1009, "message": "Table not found"})),
    );
    let operation = Operation::Describe(service("Missing"));

    let err = execute(&operation, &StubBuilder(stub)).expect_err("fault should surface");

    match err {
        CliError::Persistence(tabula_http::PersistenceError::Fault(fault)) => {
            assert_eq!(fault.code, 1009);
        }
        other => panic!("expected a fault, found {other:?}"),
    }
}

#[rstest]
fn output_is_pretty_json_with_newline() {
    let mut buffer = Vec::new();
    write_output(&mut buffer, &json!({"count": 1})).expect("write");
    let text = String::from_utf8(buffer).expect("utf-8");
    assert_eq!(text, "{\n  \"count\": 1\n}\n");
    let parsed: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(parsed, json!({"count": 1}));
}
