use serde_json::{Map, Value, json};

use form_spec::{
    FieldDescriptor, FieldKind, FormSchema, Mode, Predicate, compute_effective_fields,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "article_form" => include_str!("fixtures/article_form.json"),
        "inventory_form" => include_str!("fixtures/inventory_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn values(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

#[test]
fn create_mode_enables_plain_fields() {
    let schema: FormSchema = serde_json::from_str(fixture("article_form")).expect("deserialize");
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &Map::new());
    assert_eq!(effective.len(), 2);
    for field in &effective {
        assert!(!field.disabled, "{} disabled", field.key());
        assert!(!field.hidden, "{} hidden", field.key());
        assert!(field.predicate_error.is_none());
    }
}

#[test]
fn view_mode_disables_every_field() {
    let schema: FormSchema = serde_json::from_str(fixture("inventory_form")).expect("deserialize");
    let state = values(json!({ "sku": "A-1", "track_stock": true, "stock": 3, "bundle": [] }));
    let effective = compute_effective_fields(schema.fields(), Mode::View, &state);
    assert!(effective.iter().all(|field| field.disabled));
    assert!(effective.iter().all(|field| !field.required));
}

#[test]
fn mode_predicate_disables_sku_only_in_edit() {
    let schema: FormSchema = serde_json::from_str(fixture("inventory_form")).expect("deserialize");
    let state = schema.default_values().clone();

    let edit = compute_effective_fields(schema.fields(), Mode::Edit, &state);
    assert!(edit[0].disabled);
    let create = compute_effective_fields(schema.fields(), Mode::Create, &state);
    assert!(!create[0].disabled);
}

#[test]
fn visibility_follows_sibling_value() {
    let schema: FormSchema = serde_json::from_str(fixture("inventory_form")).expect("deserialize");
    let mut state = schema.default_values().clone();

    let stock = |state: &Map<String, Value>| {
        compute_effective_fields(schema.fields(), Mode::Create, state)
            .into_iter()
            .find(|field| field.key() == "stock")
            .map(|field| (field.hidden, field.required))
    };
    assert_eq!(stock(&state), Some((true, false)));
    state.insert("track_stock".into(), json!(true));
    assert_eq!(stock(&state), Some((false, true)));
}

#[test]
fn failing_predicate_is_fail_safe() {
    let fields = vec![
        FieldDescriptor::new("x", "X", FieldKind::Text)
            .visible_when(Predicate::truthy("profile"))
            .disabled_when(Predicate::Literal { value: false }),
        FieldDescriptor::new("y", "Y", FieldKind::Text),
    ];
    let state = values(json!({ "profile": { "nested": true }, "x": "", "y": "" }));

    let effective = compute_effective_fields(&fields, Mode::Create, &state);
    assert!(effective[0].disabled);
    assert!(!effective[0].hidden);
    assert!(effective[0].predicate_error.is_some());
    assert!(!effective[1].disabled);
    assert!(effective[1].predicate_error.is_none());
}

#[test]
fn missing_sibling_is_fail_safe() {
    let fields = vec![
        FieldDescriptor::new("max_discount", "Max discount", FieldKind::Number)
            .visible_when(Predicate::field_eq("discount_type", "percentage")),
    ];
    let effective = compute_effective_fields(&fields, Mode::Edit, &Map::new());
    assert!(effective[0].disabled);
    assert!(!effective[0].hidden);
}

#[test]
fn gate_is_idempotent() {
    let schema: FormSchema = serde_json::from_str(fixture("inventory_form")).expect("deserialize");
    let state = values(json!({ "sku": "AB-1", "track_stock": true, "stock": 2, "bundle": [] }));
    for mode in [Mode::Create, Mode::Edit, Mode::View] {
        let first = compute_effective_fields(schema.fields(), mode, &state);
        let second = compute_effective_fields(schema.fields(), mode, &state);
        assert_eq!(first, second);
    }
}
