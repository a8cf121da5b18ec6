//! OpenAPI document generated from the registered resources and their schemas.

use crate::handlers::ResourceDef;
use crate::model::{ColumnDef, ColumnKind, Models};
use crate::response::ENVELOPE_KEY;
use crate::schema::fields::{FieldSpec, NestedField, HREF};
use crate::schema::Schema as RecordSchema;
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::path::{
    HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::schema::{
    ArrayBuilder, ComponentsBuilder, KnownFormat, ObjectBuilder, Schema, SchemaFormat, Type,
};
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder, Ref, RefOr, Required};

const JSON: &str = "application/json";

fn object(builder: ObjectBuilder) -> RefOr<Schema> {
    RefOr::T(Schema::Object(builder.build()))
}

fn integer() -> ObjectBuilder {
    ObjectBuilder::new().schema_type(Type::Integer)
}

fn string() -> ObjectBuilder {
    ObjectBuilder::new().schema_type(Type::String)
}

fn column_schema(col: &ColumnDef) -> RefOr<Schema> {
    let builder = match col.kind {
        ColumnKind::Integer => integer(),
        ColumnKind::Text { max_len } => string().max_length(max_len.map(|n| n as usize)),
        ColumnKind::Date => string().format(Some(SchemaFormat::KnownFormat(KnownFormat::Date))),
    };
    object(builder.read_only(Some(col.primary_key)))
}

fn record_schema(schema: &RecordSchema) -> RefOr<Schema> {
    let mut builder = ObjectBuilder::new().schema_type(Type::Object);
    for field in schema.fields() {
        match field {
            FieldSpec::Scalar(col) => {
                builder = builder.property(col.name, column_schema(col));
                if !col.nullable && !col.primary_key {
                    builder = builder.required(col.name);
                }
            }
            FieldSpec::Related { name, view } => {
                let mut reference = ObjectBuilder::new()
                    .schema_type(Type::Object)
                    .property(view.primary_key, object(integer()));
                if view.resource.is_some() {
                    reference = reference.property(HREF, object(string().read_only(Some(true))));
                }
                for nested in &view.nested {
                    let nested_schema = match nested {
                        NestedField::Column(col) => column_schema(col),
                        NestedField::Computed(_) | NestedField::Attribute(_) => {
                            object(ObjectBuilder::new())
                        }
                    };
                    reference = reference.property(nested.name(), nested_schema);
                }
                let items = ArrayBuilder::new().items(object(reference)).build();
                builder = builder.property(*name, RefOr::T(Schema::Array(items)));
            }
        }
    }
    if schema.resource().is_some() {
        builder = builder.property(HREF, object(string().read_only(Some(true))));
    }
    object(builder)
}

fn collection_schema(record: &str) -> RefOr<Schema> {
    let items = ArrayBuilder::new()
        .items(RefOr::Ref(Ref::from_schema_name(record)))
        .build();
    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("count", object(integer()))
            .property("total", object(integer()))
            .property("limit", object(integer()))
            .property("offset", object(integer()))
            .property(ENVELOPE_KEY, RefOr::T(Schema::Array(items)))
            .required(ENVELOPE_KEY),
    )
}

fn collection_name(record: &str) -> String {
    format!("{}Collection", record)
}

fn json_response(description: &str, schema: &str) -> utoipa::openapi::Response {
    ResponseBuilder::new()
        .description(description)
        .content(
            JSON,
            ContentBuilder::new()
                .schema(Some(RefOr::Ref(Ref::from_schema_name(schema))))
                .build(),
        )
        .build()
}

fn error_response(description: &str) -> utoipa::openapi::Response {
    ResponseBuilder::new().description(description).build()
}

fn query_parameter(name: &str, description: &str) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .description(Some(description))
        .schema(Some(object(integer().minimum(Some(0.0)))))
        .build()
}

fn path_item(resource: &ResourceDef) -> utoipa::openapi::PathItem {
    let model = resource.model;
    if resource.is_item() {
        let mut get = OperationBuilder::new()
            .operation_id(Some(format!("get_{}", resource.endpoint)))
            .tag(model)
            .response("200", json_response(model, model))
            .response("404", error_response("No record with this id"));
        for param in resource.params() {
            get = get.parameter(
                ParameterBuilder::new()
                    .name(param)
                    .parameter_in(ParameterIn::Path)
                    .required(Required::True)
                    .schema(Some(object(integer()))),
            );
        }
        PathItemBuilder::new().operation(HttpMethod::Get, get).build()
    } else {
        let list = OperationBuilder::new()
            .operation_id(Some(format!("list_{}", resource.endpoint)))
            .tag(model)
            .parameter(query_parameter("limit", "Page size, default 20"))
            .parameter(query_parameter("offset", "Records to skip, default 0"))
            .response("200", json_response("One page of records", &collection_name(model)))
            .response("400", error_response("Malformed query arguments"));
        let create = OperationBuilder::new()
            .operation_id(Some(format!("create_{}", resource.endpoint)))
            .tag(model)
            .request_body(Some(
                RequestBodyBuilder::new()
                    .content(
                        JSON,
                        ContentBuilder::new()
                            .schema(Some(RefOr::Ref(Ref::from_schema_name(model))))
                            .build(),
                    )
                    .required(Some(Required::True))
                    .build(),
            ))
            .response("201", json_response("Created record", model))
            .response("422", error_response("Invalid record"));
        PathItemBuilder::new()
            .operation(HttpMethod::Get, list)
            .operation(HttpMethod::Post, create)
            .build()
    }
}

/// The document served at `/swagger.json`.
pub fn openapi(models: &Models, resources: &[&ResourceDef]) -> OpenApi {
    let mut paths = PathsBuilder::new();
    for resource in resources {
        paths = paths.path(resource.openapi_path(), path_item(resource));
    }

    let mut components = ComponentsBuilder::new();
    for rt in models.record_types() {
        if let Ok(schema) = models.schema(rt.name) {
            components = components
                .schema(rt.name, record_schema(schema))
                .schema(collection_name(rt.name), collection_schema(rt.name));
        }
    }

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(env!("CARGO_PKG_NAME"))
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths.build())
        .components(Some(components.build()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::RESOURCES;
    use crate::model::RECORD_TYPES;
    use serde_json::json;

    #[test]
    fn every_resource_is_documented() {
        let models = Models::build(RECORD_TYPES).unwrap();
        let doc = serde_json::to_value(openapi(&models, RESOURCES)).unwrap();
        for path in ["/books", "/books/{id}", "/authors", "/authors/{id}"] {
            assert!(doc["paths"][path].is_object(), "missing {}", path);
        }
        assert!(doc["paths"]["/books"]["post"].is_object());
        assert!(doc["paths"]["/books/{id}"]["post"].is_null());
        let book = &doc["components"]["schemas"]["Book"];
        assert_eq!(book["properties"]["authors"]["type"], json!("array"));
        assert!(book["properties"]["authors"]["items"]["properties"]["href"].is_object());
        assert!(doc["components"]["schemas"]["BookCollection"]["properties"]["items"].is_object());
    }
}
