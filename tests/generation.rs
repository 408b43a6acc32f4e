use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use crudgen::{
    crud_routes, load_from_str, openapi_document, resolve, routers_from_config, AppState, ConfigError,
    CrudRouter, MemoryStore, OptionalFields, Schema, SchemaConfig, UrlFragment, Verb,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

const CONFIG: &str = r#"{
    "models": [
        {"app_label": "shop", "name": "Product", "fields": [
            {"name": "name", "type": "text"},
            {"name": "price", "type": "float"},
            {"name": "note", "type": "text", "nullable": true}]},
        {"app_label": "shop", "name": "Category", "verbose_name_plural": "categories", "fields": [
            {"name": "name", "type": "text"}]}
    ],
    "routers": [
        {"app_label": "shop", "model": "Product",
         "response_schema_configs": {"GETLIST": {"name": "{model}Summary", "fields": ["id", "name"]}},
         "request_schema_configs": {"POST": {"optional_fields": ["note"]}},
         "descriptions": {"DELETE": "Remove a product"}},
        {"app_label": "shop", "model": "Category", "methods": ["GETLIST", "POST"]}
    ]
}"#;

#[test]
fn config_routers_build_views_per_verb() {
    let config = load_from_str(CONFIG).unwrap();
    let registry = resolve(&config).unwrap();
    let groups = routers_from_config(&config.routers, &registry).unwrap();
    assert_eq!(groups.len(), 2);

    let product = &groups[0];
    assert_eq!(product.base_url_path(), "/products/");
    for view in product.views() {
        let expected = match view.verb {
            Verb::GetList | Verb::Post => UrlFragment::Collection,
            _ => UrlFragment::Item,
        };
        assert_eq!(view.url_fragment, expected);
    }
    let list = product.view(Verb::GetList).unwrap();
    let out = list.response_schema.as_ref().unwrap();
    assert_eq!(out.name, "ProductSummary");
    assert_eq!(
        out.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["id", "name"]
    );
    let post_in = product.view(Verb::Post).unwrap().request_schema.clone().unwrap();
    assert_eq!(post_in.name, "GeneratedProductIn");
    assert!(post_in.field("note").unwrap().optional);
    assert!(!post_in.field("price").unwrap().optional);
    assert_eq!(
        product.view(Verb::Delete).unwrap().description.as_deref(),
        Some("Remove a product")
    );

    let category = &groups[1];
    assert_eq!(category.base_url_path(), "/categories/");
    assert_eq!(
        category.views().iter().map(|v| v.verb).collect::<Vec<_>>(),
        vec![Verb::GetList, Verb::Post]
    );
}

#[test]
fn handler_names_unique_across_models_sharing_fields() {
    let config = load_from_str(CONFIG).unwrap();
    let registry = resolve(&config).unwrap();
    let groups = vec![
        CrudRouter::builder().app_label("shop").model("Product").build(&registry).unwrap(),
        CrudRouter::builder().app_label("shop").model("Category").build(&registry).unwrap(),
    ];
    let names: HashSet<&str> = groups
        .iter()
        .flat_map(|g| g.views().iter().map(|v| v.handler_name.as_str()))
        .collect();
    assert_eq!(names.len(), 12);
    assert!(names.contains("product_get_list"));
    assert!(names.contains("category_get_list"));

    let doc = serde_json::to_value(openapi_document(&groups, "shop", "1.0.0").unwrap()).unwrap();
    let mut ids = Vec::new();
    for item in doc["paths"].as_object().unwrap().values() {
        for op in item.as_object().unwrap().values() {
            if let Some(id) = op.get("operationId").and_then(Value::as_str) {
                ids.push(id.to_string());
            }
        }
    }
    ids.sort();
    let mut expected: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn explicit_schema_with_config_is_a_usage_error() {
    let registry = resolve(&load_from_str(CONFIG).unwrap()).unwrap();
    let dummy = Arc::new(Schema::new("DummySchema", vec![]));
    for verb in Verb::ALL {
        let err = CrudRouter::builder()
            .app_label("shop")
            .model("Product")
            .methods([verb])
            .response_schema(verb, dummy.clone())
            .response_schema_config(verb, SchemaConfig {
                optional_fields: Some(OptionalFields::All),
                ..Default::default()
            })
            .build(&registry)
            .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaAndConfig { direction: "response" }), "{}", verb);
    }
}

#[test]
fn bad_templates_and_field_lists_fail() {
    let registry = resolve(&load_from_str(CONFIG).unwrap()).unwrap();
    let err = CrudRouter::builder()
        .app_label("shop")
        .model("Product")
        .response_schema_config(Verb::Get, SchemaConfig {
            name: Some("{model}{unknown}".into()),
            ..Default::default()
        })
        .build(&registry)
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTemplate { .. }));

    let err = CrudRouter::builder()
        .app_label("shop")
        .model("Product")
        .request_schema_config(Verb::Post, SchemaConfig {
            fields: Some(vec!["name".into()]),
            exclude: Some(vec!["price".into()]),
            ..Default::default()
        })
        .build(&registry)
        .unwrap_err();
    assert!(matches!(err, ConfigError::FieldsAndExclude));
}

#[tokio::test]
async fn response_shape_follows_configured_fields() {
    let config = load_from_str(CONFIG).unwrap();
    let registry = resolve(&config).unwrap();
    let groups = routers_from_config(&config.routers, &registry).unwrap();
    let app = crud_routes(&groups, AppState::new(MemoryStore::new())).unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/products/")
        .header("content-type", "application/json")
        .body(Body::from(json!({"name": "pen", "price": 1.5}).to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body, json!({"id": 1, "name": "pen", "price": 1.5, "note": null}));

    let req = Request::builder().uri("/products/").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    let body: Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body, json!([{"id": 1, "name": "pen"}]));
}
