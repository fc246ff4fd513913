use openapi_typegen::{parse, AppError, Document, Placement, Primitive, TypeExpr};
use pretty_assertions::assert_eq;
use serde_json::json;

fn pets_document() -> Document {
    Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/pets/{id}": {
                "get": {
                    "operationId": "getPetUsingGET",
                    "summary": "Get a pet",
                    "parameters": [
                        {
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Pet" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                }
            }
        }
    }))
    .unwrap()
}

#[test]
fn test_end_to_end_pets_example() {
    let document = pets_document();
    let result = parse(&document, "/pets/{id}", "get").unwrap().unwrap();

    assert_eq!(result.name, "getPet");
    assert_eq!(result.comment, "Get a pet");
    assert_eq!(
        result.path_var,
        Some(TypeExpr::Named("GetPetPathVar".into()))
    );
    assert_eq!(result.res, Some(TypeExpr::Named("Pet".into())));
    assert!(result.body.is_none());
    assert!(result.query.is_none());
    assert!(!result.is_form_data);

    let names: Vec<&str> = result.interfaces.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["GetPetPathVar", "Pet"]);

    let path_var = &result.interfaces[0];
    assert_eq!(path_var.placement, Some(Placement::Path));
    assert_eq!(path_var.fields.len(), 1);
    assert_eq!(path_var.fields[0].name, "id");
    assert!(path_var.fields[0].required);
    assert_eq!(
        path_var.fields[0].ty,
        TypeExpr::Primitive(Primitive::String)
    );

    let pet = &result.interfaces[1];
    assert_eq!(pet.fields.len(), 1);
    assert_eq!(pet.fields[0].name, "name");
    assert!(pet.fields[0].required);
    assert_eq!(pet.fields[0].ty, TypeExpr::Primitive(Primitive::String));
}

#[test]
fn test_missing_operation_is_absence_not_error() {
    let document = pets_document();
    assert!(parse(&document, "/nonexistent", "get").unwrap().is_none());
    assert!(parse(&document, "/pets/{id}", "post").unwrap().is_none());
}

#[test]
fn test_parse_is_deterministic() {
    let document = pets_document();
    let first = parse(&document, "/pets/{id}", "get").unwrap().unwrap();
    let second = parse(&document, "/pets/{id}", "get").unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_mutually_referencing_schemas_terminate() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/a": {
                "get": {
                    "operationId": "getA",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/A" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "A": {
                    "type": "object",
                    "properties": { "b": { "$ref": "#/components/schemas/B" } }
                },
                "B": {
                    "type": "object",
                    "properties": { "a": { "$ref": "#/components/schemas/A" } }
                }
            }
        }
    }))
    .unwrap();

    let result = parse(&document, "/a", "get").unwrap().unwrap();
    let names: Vec<&str> = result.interfaces.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);

    assert_eq!(result.interfaces[0].fields[0].ty, TypeExpr::Named("B".into()));
    assert_eq!(result.interfaces[1].fields[0].ty, TypeExpr::Named("A".into()));
}

#[test]
fn test_shared_reference_is_deduplicated_and_never_dangles() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/pets": {
                "post": {
                    "operationId": "createPet",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Pet" }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Pet" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                }
            }
        }
    }))
    .unwrap();

    let result = parse(&document, "/pets", "post").unwrap().unwrap();

    let mut names: Vec<&str> = result.interfaces.iter().map(|r| r.name.as_str()).collect();
    let before = names.len();
    names.dedup();
    assert_eq!(before, names.len());

    // Every name referenced by a top-level expression or field resolves.
    let mut referenced: Vec<&str> = Vec::new();
    for expr in [&result.body, &result.path_var, &result.query, &result.res]
        .into_iter()
        .flatten()
    {
        referenced.extend(expr.referenced_names());
    }
    for record in &result.interfaces {
        for field in &record.fields {
            referenced.extend(field.ty.referenced_names());
        }
    }
    for name in referenced {
        assert!(
            result.interfaces.iter().any(|r| r.name == name),
            "dangling name: {}",
            name
        );
    }
}

#[test]
fn test_reserved_definition_name_is_escaped() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/c": {
                "get": {
                    "operationId": "getC",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/class" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "class": {
                    "type": "object",
                    "properties": { "id": { "type": "number" } }
                }
            }
        }
    }))
    .unwrap();

    let result = parse(&document, "/c", "get").unwrap().unwrap();
    assert_eq!(result.res, Some(TypeExpr::Named("__openAPI__class".into())));
    assert_eq!(result.interfaces[0].name, "__openAPI__class");
}

#[test]
fn test_numeric_definition_name_gets_transliteration_marker() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/n": {
                "get": {
                    "operationId": "getN",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/123" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "123": {
                    "type": "object",
                    "properties": { "id": { "type": "number" } }
                }
            }
        }
    }))
    .unwrap();

    let result = parse(&document, "/n", "get").unwrap().unwrap();
    assert_eq!(result.interfaces[0].name, "Pinyin_123");
}

#[test]
fn test_unresolved_reference_is_fatal() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/x": {
                "get": {
                    "operationId": "getX",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Missing" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let err = parse(&document, "/x", "get").unwrap_err();
    assert!(matches!(err, AppError::UnresolvedReference(_)));
}

#[test]
fn test_query_group_enum_and_placement() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [
                        {
                            "name": "status",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "string", "enum": ["available", "sold", "available"] }
                        },
                        {
                            "name": "limit",
                            "in": "query",
                            "schema": { "type": "integer", "format": "int32" }
                        }
                    ],
                    "responses": {}
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/pets", "get").unwrap().unwrap();
    assert_eq!(result.query, Some(TypeExpr::Named("ListPetsQuery".into())));

    let query = &result.interfaces[0];
    assert_eq!(query.name, "ListPetsQuery");
    assert_eq!(query.placement, Some(Placement::Body));
    assert_eq!(
        query.fields[0].ty,
        TypeExpr::LiteralUnion(vec!["\"available\"".into(), "\"sold\"".into()])
    );
    assert_eq!(query.fields[0].ty.to_string(), "\"available\" | \"sold\"");
    assert!(!query.fields[0].required);
    assert_eq!(query.fields[1].ty, TypeExpr::Primitive(Primitive::Number));
}

#[test]
fn test_undeclared_path_template_var_becomes_synthetic_param() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/stores/{storeId}/orders/{orderId}": {
                "get": {
                    "operationId": "getOrder",
                    "parameters": [
                        {
                            "name": "storeId",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "integer" }
                        }
                    ],
                    "responses": {}
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/stores/{storeId}/orders/{orderId}", "get")
        .unwrap()
        .unwrap();

    let path_var = &result.interfaces[0];
    assert_eq!(path_var.name, "GetOrderPathVar");
    let fields: Vec<(&str, &TypeExpr, bool)> = path_var
        .fields
        .iter()
        .map(|f| (f.name.as_str(), &f.ty, f.required))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("storeId", &TypeExpr::Primitive(Primitive::Number), true),
            ("orderId", &TypeExpr::Primitive(Primitive::String), true),
        ]
    );
}

#[test]
fn test_one_of_union_and_parenthesized_array_element() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/u": {
                "get": {
                    "operationId": "getU",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": {
                                            "oneOf": [
                                                { "type": "string" },
                                                { "type": "number" }
                                            ]
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/u", "get").unwrap().unwrap();
    assert_eq!(result.res.unwrap().to_string(), "(string | number)[]");
}

#[test]
fn test_all_of_intersection() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/i": {
                "get": {
                    "operationId": "getI",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "allOf": [
                                            { "$ref": "#/components/schemas/Base" },
                                            { "$ref": "#/components/schemas/Extra" }
                                        ]
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Base": {
                    "type": "object",
                    "properties": { "id": { "type": "number" } }
                },
                "Extra": {
                    "type": "object",
                    "properties": { "note": { "type": "string" } }
                }
            }
        }
    }))
    .unwrap();

    let result = parse(&document, "/i", "get").unwrap().unwrap();
    assert_eq!(result.res.unwrap().to_string(), "(Base & Extra)");
    let names: Vec<&str> = result.interfaces.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Base", "Extra"]);
}

#[test]
fn test_tuple_style_array_items() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/t": {
                "get": {
                    "operationId": "getT",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": [
                                            { "type": "string" },
                                            { "type": "number" }
                                        ]
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/t", "get").unwrap().unwrap();
    assert_eq!(result.res.unwrap().to_string(), "[string, number]");
}

#[test]
fn test_object_body_is_promoted_to_named_record() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/pets": {
                "post": {
                    "operationId": "createPet",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "name": { "type": "string" },
                                        "age": { "type": "integer" }
                                    },
                                    "required": ["name"]
                                }
                            }
                        }
                    },
                    "responses": {}
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/pets", "post").unwrap().unwrap();
    assert_eq!(result.body, Some(TypeExpr::Named("CreatePetBody".into())));
    assert!(!result.is_form_data);

    let body = &result.interfaces[0];
    assert_eq!(body.name, "CreatePetBody");
    assert_eq!(body.placement, Some(Placement::Body));
    assert!(body.fields[0].required);
    assert!(!body.fields[1].required);
}

#[test]
fn test_multipart_body_flags_form_data_and_file_fields() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/upload": {
                "post": {
                    "operationId": "uploadFile",
                    "requestBody": {
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "file": { "type": "string", "format": "binary" },
                                        "gallery": {
                                            "type": "array",
                                            "items": { "type": "string", "format": "binary" }
                                        },
                                        "note": { "type": "string" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {}
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/upload", "post").unwrap().unwrap();
    assert!(result.is_form_data);
    assert_eq!(result.body, Some(TypeExpr::Named("UploadFileBody".into())));

    let body = &result.interfaces[0];
    assert_eq!(body.fields[0].name, "file");
    assert_eq!(body.fields[0].ty, TypeExpr::Primitive(Primitive::File));
    assert_eq!(
        body.fields[1].ty,
        TypeExpr::Array(Box::new(TypeExpr::Primitive(Primitive::File)))
    );
    assert_eq!(body.fields[2].ty, TypeExpr::Primitive(Primitive::String));
}

#[test]
fn test_wildcard_media_type_is_not_form_data() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/raw": {
                "post": {
                    "operationId": "postRaw",
                    "requestBody": {
                        "content": {
                            "*/*": {
                                "schema": { "type": "string" }
                            }
                        }
                    },
                    "responses": {}
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/raw", "post").unwrap().unwrap();
    assert!(!result.is_form_data);
    assert_eq!(result.body, Some(TypeExpr::Primitive(Primitive::String)));
}

#[test]
fn test_schemaless_response_degrades_to_default_shape() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/d": {
                "get": {
                    "operationId": "getD",
                    "responses": {
                        "200": {
                            "content": { "application/json": {} }
                        }
                    }
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/d", "get").unwrap().unwrap();
    assert_eq!(result.res.unwrap().to_string(), "{\nid?: number;\n}");
}

#[test]
fn test_response_required_list_propagates_to_inline_fields() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/r": {
                "get": {
                    "operationId": "getR",
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "a": { "type": "string" },
                                            "b": { "type": "string" }
                                        },
                                        "required": ["a"]
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/r", "get").unwrap().unwrap();
    let rendered = result.res.unwrap().to_string();
    assert_eq!(rendered, "{\na: string;\nb?: string;\n}");
}

#[test]
fn test_date_formats_map_to_date_keyword() {
    let document = Document::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/e" : {
                "get": {
                    "operationId": "getE",
                    "parameters": [
                        { "name": "since", "in": "query", "schema": { "type": "date-time" } }
                    ],
                    "responses": {}
                }
            }
        },
        "components": { "schemas": {} }
    }))
    .unwrap();

    let result = parse(&document, "/e", "get").unwrap().unwrap();
    assert_eq!(
        result.interfaces[0].fields[0].ty,
        TypeExpr::Primitive(Primitive::Date)
    );
}
