use serde_json::{Map, Value, json};

use form_spec::{
    FieldDescriptor, FieldKind, FormSchema, Mode, RuleSetValidator, SchemaIntegrityError, catalog,
    validate,
};

fn values(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

#[test]
fn schema_keys_match_defaults_both_ways() {
    for entity in catalog::entities() {
        let schema = catalog::get(entity).expect("schema");
        let keys: Vec<&str> = schema.keys().collect();
        for key in &keys {
            assert!(schema.default_values().contains_key(*key), "{}.{}", entity, key);
        }
        for key in schema.default_values().keys() {
            assert!(keys.contains(&key.as_str()), "{}.{} orphan", entity, key);
        }
    }
}

#[test]
fn deserializing_runs_integrity_checks() {
    let err = serde_json::from_value::<FormSchema>(json!({
        "id": "article",
        "title": "Article",
        "fields": [
            { "key": "name", "type": "text", "label": "Name" },
            { "key": "status", "type": "select", "label": "Status", "options": [] }
        ],
        "default_values": { "name": "", "status": null }
    }))
    .expect_err("empty options");
    assert!(err.to_string().contains("declares no options"));

    let err = serde_json::from_value::<FormSchema>(json!({
        "id": "article",
        "title": "Article",
        "fields": [{ "key": "name", "type": "text", "label": "Name" }],
        "default_values": {}
    }))
    .expect_err("missing default");
    assert!(err.to_string().contains("has no default value"));
}

#[test]
fn missing_default_is_reported_by_key() {
    let doc = serde_json::from_value(json!({
        "id": "article",
        "title": "Article",
        "fields": [
            { "key": "name", "type": "text", "label": "Name" },
            { "key": "body", "type": "text_area", "label": "Body" }
        ],
        "default_values": { "name": "" }
    }))
    .expect("document");
    assert_eq!(
        FormSchema::new(doc),
        Err(SchemaIntegrityError::MissingDefault {
            schema: "article".into(),
            key: "body".into(),
        })
    );
}

#[test]
fn rules_and_types_are_enforced() {
    let schema = catalog::get("coupon").expect("coupon");
    let answers = values(json!({
        "code": "summer",
        "discount_type": "percentage",
        "discount_value": 0,
        "max_discount": "lots",
        "min_order_amount": null,
        "valid_from": "2024-06-01",
        "valid_until": "2024-06-31",
        "usage_limit": null,
        "active": true,
        "company_id": "c-1"
    }));
    let result = validate(schema, &answers, Mode::Create, &RuleSetValidator);
    assert!(!result.valid);
    let codes: Vec<(&str, &str)> = result
        .errors
        .iter()
        .map(|error| (error.key.as_str(), error.code.as_str()))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("code", "pattern_mismatch"),
            ("discount_value", "min"),
            ("max_discount", "type_mismatch"),
            ("valid_until", "invalid_date"),
        ]
    );
}

#[test]
fn hidden_fields_are_not_validated() {
    let schema = catalog::get("coupon").expect("coupon");
    let answers = values(json!({
        "code": "SUMMER24",
        "discount_type": "fixed",
        "discount_value": 10,
        "max_discount": "ignored while hidden",
        "min_order_amount": 0,
        "valid_from": "2024-06-01",
        "valid_until": "2024-06-30",
        "usage_limit": null,
        "active": true,
        "company_id": "c-1"
    }));
    let result = validate(schema, &answers, Mode::Create, &RuleSetValidator);
    assert!(result.valid, "{:?}", result.errors);
}

#[test]
fn nested_rows_report_indexed_paths() {
    let schema = catalog::get("survey").expect("survey");
    let mut answers = schema.default_values().clone();
    answers.insert("title".into(), json!("Checkout feedback"));
    answers.insert("start_date".into(), json!("2024-01-10"));
    answers.insert("company_id".into(), json!("c-1"));
    answers.insert(
        "questions".into(),
        json!([
            { "question": "How was it?", "answer_type": "rating", "choices": "" },
            { "question": "", "answer_type": "poll", "choices": "" }
        ]),
    );
    let result = validate(schema, &answers, Mode::Create, &RuleSetValidator);
    let keys: Vec<&str> = result.errors.iter().map(|error| error.key.as_str()).collect();
    assert_eq!(keys, vec!["questions[1].question", "questions[1].answer_type"]);
}

#[test]
fn requirement_can_depend_on_sibling() {
    let schema = catalog::get("survey").expect("survey");
    let mut answers = schema.default_values().clone();
    answers.insert("title".into(), json!("Checkout feedback"));
    answers.insert("start_date".into(), json!("2024-01-10"));
    answers.insert("company_id".into(), json!("c-1"));
    answers.insert(
        "questions".into(),
        json!([{ "question": "How was it?", "answer_type": "rating", "choices": "" }]),
    );
    assert!(validate(schema, &answers, Mode::Create, &RuleSetValidator).valid);

    answers.insert("status".into(), json!("published"));
    let result = validate(schema, &answers, Mode::Create, &RuleSetValidator);
    assert_eq!(result.errors[0].key, "end_date");
    assert_eq!(result.errors[0].code, "required");
}

fn wholesale() -> FormSchema {
    serde_json::from_str(include_str!("fixtures/wholesale_form.json")).expect("deserialize")
}

#[test]
fn hidden_row_fields_are_not_required() {
    let schema = wholesale();
    let answers = values(json!({
        "wholesale": false,
        "variants": [{ "name": "Red", "note": "n" }]
    }));
    let result = validate(&schema, &answers, Mode::Create, &RuleSetValidator);
    assert!(result.valid, "{:?}", result.errors);

    let answers = values(json!({
        "wholesale": true,
        "variants": [{ "name": "Red", "note": "n" }]
    }));
    let result = validate(&schema, &answers, Mode::Create, &RuleSetValidator);
    let keys: Vec<&str> = result.errors.iter().map(|error| error.key.as_str()).collect();
    assert_eq!(keys, vec!["variants[0].bulk_price"]);
}

#[test]
fn row_requirement_follows_predicates() {
    let schema = wholesale();
    let answers = values(json!({
        "wholesale": false,
        "variants": [{ "name": "Red", "note": "" }]
    }));
    let result = validate(&schema, &answers, Mode::Create, &RuleSetValidator);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].key, "variants[0].note");
    assert_eq!(result.errors[0].code, "required");

    assert!(validate(&schema, &answers, Mode::Edit, &RuleSetValidator).valid);
}

#[test]
fn date_parts_must_be_digits() {
    let schema = FormSchema::builder("event", "Event")
        .field(FieldDescriptor::new("starts_on", "Starts on", FieldKind::Date))
        .build()
        .expect("schema");
    let answers = values(json!({ "starts_on": "+202-+1-01" }));
    let result = validate(&schema, &answers, Mode::Create, &RuleSetValidator);
    assert_eq!(result.errors[0].code, "invalid_date");

    let answers = values(json!({ "starts_on": "2024-01-31" }));
    assert!(validate(&schema, &answers, Mode::Create, &RuleSetValidator).valid);
}
