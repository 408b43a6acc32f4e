//! OpenAPI document for a set of CRUD groups: one operation per view, shapes as components.

use crate::config::FieldType;
use crate::error::ConfigError;
use crate::generator::ResponseShape;
use crate::routes::CrudRouter;
use crate::schema::{Schema, SchemaField, SchemaFieldType};
use crate::verb::Verb;
use crate::view::{check_schema_names, View};
use axum::http::StatusCode;
use std::collections::BTreeMap;
use utoipa::openapi::path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::{
    ArrayBuilder, KnownFormat, ObjectBuilder, SchemaFormat, SchemaType, Type,
};
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{
    ComponentsBuilder, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder, Ref,
    RefOr, Required, ResponseBuilder,
};

const JSON: &str = "application/json";

/// Fails when one schema name is used for two different shapes.
pub fn openapi_document(groups: &[CrudRouter], title: &str, version: &str) -> Result<OpenApi, ConfigError> {
    check_schema_names(groups.iter().flat_map(|g| g.views()))?;
    let mut schemas: BTreeMap<String, RefOr<utoipa::openapi::Schema>> = BTreeMap::new();
    let mut paths: BTreeMap<String, Vec<(HttpMethod, utoipa::openapi::path::Operation)>> = BTreeMap::new();
    let mut tags = Vec::new();

    for group in groups {
        tags.push(TagBuilder::new().name(group.tag()).build());
        let prefix = group.base_url_path().trim_end_matches('/');
        for view in group.views() {
            let path = format!("{}{}", prefix, view.url_fragment.as_str());
            for schema in view.schemas() {
                schemas
                    .entry(schema.name.clone())
                    .or_insert_with(|| component(schema));
            }
            paths
                .entry(path)
                .or_default()
                .push((http_method(view.verb), operation(view)));
        }
    }

    let mut builder = PathsBuilder::new();
    for (path, operations) in paths {
        let item = operations
            .into_iter()
            .fold(PathItemBuilder::new(), |item, (method, op)| item.operation(method, op))
            .build();
        builder = builder.path(path, item);
    }
    let components = schemas
        .into_iter()
        .fold(ComponentsBuilder::new(), |c, (name, schema)| c.schema(name, schema))
        .build();

    Ok(OpenApiBuilder::new()
        .info(InfoBuilder::new().title(title).version(version).build())
        .paths(builder.build())
        .components(Some(components))
        .tags(Some(tags))
        .build())
}

fn http_method(verb: Verb) -> HttpMethod {
    match verb {
        Verb::Get | Verb::GetList => HttpMethod::Get,
        Verb::Post => HttpMethod::Post,
        Verb::Put => HttpMethod::Put,
        Verb::Patch => HttpMethod::Patch,
        Verb::Delete => HttpMethod::Delete,
    }
}

fn schema_ref(name: &str) -> RefOr<utoipa::openapi::Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn operation(view: &View) -> utoipa::openapi::path::Operation {
    let mut op = OperationBuilder::new()
        .operation_id(Some(view.handler_name.clone()))
        .tag(view.tag.clone())
        .description(view.description.clone());
    if view.url_fragment.as_str().contains("{id}") {
        let id = ObjectBuilder::new()
            .schema_type(Type::Integer)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64)))
            .build();
        op = op.parameter(
            ParameterBuilder::new()
                .name("id")
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .schema(Some(RefOr::T(utoipa::openapi::Schema::Object(id))))
                .build(),
        );
    }
    if let Some(request) = &view.request_schema {
        let body = RequestBodyBuilder::new()
            .content(JSON, ContentBuilder::new().schema(Some(schema_ref(&request.name))).build())
            .required(Some(Required::True))
            .build();
        op = op.request_body(Some(body));
    }
    for (status, shape) in view.response_config.iter() {
        let description = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Response");
        let response = ResponseBuilder::new().description(description);
        let response = match shape {
            ResponseShape::Empty => response,
            ResponseShape::One(s) => {
                response.content(JSON, ContentBuilder::new().schema(Some(schema_ref(&s.name))).build())
            }
            ResponseShape::Many(s) => {
                let array = ArrayBuilder::new().items(schema_ref(&s.name)).build();
                response.content(
                    JSON,
                    ContentBuilder::new()
                        .schema(Some(RefOr::T(utoipa::openapi::Schema::Array(array))))
                        .build(),
                )
            }
        };
        op = op.response(status.to_string(), response.build());
    }
    op.build()
}

fn component(schema: &Schema) -> RefOr<utoipa::openapi::Schema> {
    let mut object = ObjectBuilder::new().schema_type(Type::Object).title(Some(schema.name.clone()));
    for field in &schema.fields {
        object = object.property(field.name.clone(), property(field));
        if !field.optional {
            object = object.required(field.name.clone());
        }
    }
    RefOr::T(utoipa::openapi::Schema::Object(object.build()))
}

fn property(field: &SchemaField) -> RefOr<utoipa::openapi::Schema> {
    let typed = |ty: Type| {
        if field.nullable {
            SchemaType::Array(vec![ty, Type::Null])
        } else {
            SchemaType::Type(ty)
        }
    };
    let object = match field.ty {
        SchemaFieldType::RelationIds => {
            let item = ObjectBuilder::new()
                .schema_type(Type::Integer)
                .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64)))
                .build();
            let array = ArrayBuilder::new()
                .items(RefOr::T(utoipa::openapi::Schema::Object(item)))
                .build();
            return RefOr::T(utoipa::openapi::Schema::Array(array));
        }
        SchemaFieldType::RelationId | SchemaFieldType::Plain(FieldType::Integer) => ObjectBuilder::new()
            .schema_type(typed(Type::Integer))
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64))),
        SchemaFieldType::Plain(FieldType::Float) => ObjectBuilder::new()
            .schema_type(typed(Type::Number))
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Double))),
        SchemaFieldType::Plain(FieldType::Text) => ObjectBuilder::new().schema_type(typed(Type::String)),
        SchemaFieldType::Plain(FieldType::Boolean) => ObjectBuilder::new().schema_type(typed(Type::Boolean)),
        SchemaFieldType::Plain(FieldType::Date) => ObjectBuilder::new()
            .schema_type(typed(Type::String))
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Date))),
        SchemaFieldType::Plain(FieldType::Datetime) => ObjectBuilder::new()
            .schema_type(typed(Type::String))
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::DateTime))),
        SchemaFieldType::Plain(FieldType::Uuid) => ObjectBuilder::new()
            .schema_type(typed(Type::String))
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Uuid))),
        SchemaFieldType::Plain(FieldType::Json) => ObjectBuilder::new().schema_type(SchemaType::AnyValue),
    };
    RefOr::T(utoipa::openapi::Schema::Object(object.build()))
}
