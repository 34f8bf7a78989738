use serde_json::{Map, Value, json};

use form_spec::{
    Control, FormSchema, Mode, RenderError, catalog, compute_effective_fields, render,
    render_json_ui, render_text,
};

fn inventory() -> FormSchema {
    serde_json::from_str(include_str!("fixtures/inventory_form.json")).expect("deserialize")
}

fn values(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object")
}

#[test]
fn hidden_fields_are_not_rendered() {
    let schema = inventory();
    let state = schema.default_values().clone();
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &state);
    let rendered = render(&effective, &state);

    assert_eq!(
        rendered.keys().collect::<Vec<_>>(),
        vec!["sku", "track_stock", "bundle"]
    );
    assert!(rendered.node("stock").is_none());
}

#[test]
fn hidden_fields_never_emit_changes() {
    let schema = inventory();
    let state = schema.default_values().clone();
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &state);
    let rendered = render(&effective, &state);

    let mut emitted = Vec::new();
    let err = rendered
        .edit("stock", json!(5), |key, value| emitted.push((key.to_string(), value)))
        .expect_err("hidden");
    assert_eq!(err, RenderError::NotRendered("stock".into()));
    assert!(emitted.is_empty());
}

#[test]
fn disabled_fields_never_emit_changes() {
    let schema = inventory();
    let state = values(json!({ "sku": "AB-1", "track_stock": false, "stock": null, "bundle": [] }));
    let effective = compute_effective_fields(schema.fields(), Mode::Edit, &state);
    let rendered = render(&effective, &state);

    let mut emitted = Vec::new();
    let err = rendered
        .edit("sku", json!("CD-2"), |key, value| emitted.push((key.to_string(), value)))
        .expect_err("disabled");
    assert_eq!(err, RenderError::Disabled("sku".into()));
    assert!(emitted.is_empty());

    rendered
        .edit("track_stock", json!(true), |key, value| {
            emitted.push((key.to_string(), value))
        })
        .expect("enabled");
    assert_eq!(emitted, vec![("track_stock".to_string(), json!(true))]);
}

#[test]
fn controls_follow_field_kind() {
    let schema = catalog::get("product").expect("product");
    let mut state = schema.default_values().clone();
    state.insert("has_variants".into(), json!(true));
    state.insert(
        "variants".into(),
        json!([{ "name": "Red", "sku": "RED-1", "price": 10 }]),
    );
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &state);
    let rendered = render(&effective, &state);

    let control = |key: &str| rendered.node(key).map(|node| node.control.label());
    assert_eq!(control("name"), Some("text_input"));
    assert_eq!(control("description"), Some("text_area"));
    assert_eq!(control("price"), Some("number_input"));
    assert_eq!(control("currency"), Some("dropdown"));
    assert_eq!(control("tags"), Some("multi_select"));
    assert_eq!(control("images"), Some("file_upload"));
    assert_eq!(control("has_variants"), Some("toggle"));

    let variants = rendered.node("variants").expect("variants");
    let Control::Nested { items, .. } = &variants.control else {
        panic!("variants should render nested rows");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0][1].key, "variants[0].sku");
    assert_eq!(items[0][1].value, json!("RED-1"));
}

#[test]
fn nested_edit_emits_parent_list() {
    let schema = inventory();
    let state = values(json!({
        "sku": "AB-1",
        "track_stock": false,
        "stock": null,
        "bundle": [{ "sku": "X-1", "quantity": 1 }]
    }));
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &state);
    let rendered = render(&effective, &state);

    let mut emitted = Vec::new();
    rendered
        .edit("bundle[0].quantity", json!(4), |key, value| {
            emitted.push((key.to_string(), value))
        })
        .expect("nested edit");
    assert_eq!(
        emitted,
        vec![("bundle".to_string(), json!([{ "sku": "X-1", "quantity": 4 }]))]
    );

    let err = rendered
        .edit("bundle[3].quantity", json!(1), |_, _| {})
        .expect_err("out of range");
    assert!(matches!(err, RenderError::InvalidPath(_)));
}

#[test]
fn push_item_respects_max_items() {
    let schema = inventory();
    let state = values(json!({
        "sku": "AB-1",
        "track_stock": false,
        "stock": null,
        "bundle": [{ "sku": "X-1", "quantity": 1 }]
    }));
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &state);
    let rendered = render(&effective, &state);

    let mut emitted = Vec::new();
    rendered
        .push_item("bundle", |key, value| emitted.push((key.to_string(), value)))
        .expect("push");
    assert_eq!(emitted[0].1[1], json!({ "sku": "", "quantity": null }));

    let mut full = state.clone();
    full.insert("bundle".into(), emitted[0].1.clone());
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &full);
    let err = render(&effective, &full)
        .push_item("bundle", |_, _| {})
        .expect_err("full");
    assert!(matches!(err, RenderError::TooManyItems { max: 2, .. }));
}

#[test]
fn labels_interpolate_form_values() {
    let schema = catalog::get("product").expect("product");
    let mut state = schema.default_values().clone();
    state.insert("currency".into(), json!("EUR"));
    let effective = compute_effective_fields(schema.fields(), Mode::Create, &state);
    let rendered = render(&effective, &state);
    assert_eq!(rendered.node("price").map(|node| node.label.as_str()), Some("Price (EUR)"));
}

#[test]
fn same_fields_back_independent_instances() {
    let schema = inventory();
    let first = values(json!({ "sku": "AAA", "track_stock": true, "stock": 1, "bundle": [] }));
    let second = schema.default_values().clone();

    let rendered_first = render(
        &compute_effective_fields(schema.fields(), Mode::Create, &first),
        &first,
    );
    let rendered_second = render(
        &compute_effective_fields(schema.fields(), Mode::Create, &second),
        &second,
    );
    assert_eq!(rendered_first.node("sku").map(|n| &n.value), Some(&json!("AAA")));
    assert_eq!(rendered_second.node("sku").map(|n| &n.value), Some(&json!("")));
    assert!(rendered_first.node("stock").is_some());
    assert!(rendered_second.node("stock").is_none());
}

#[test]
fn text_and_json_outputs() {
    let schema = inventory();
    let state = schema.default_values().clone();
    let effective = compute_effective_fields(schema.fields(), Mode::View, &state);
    let rendered = render(&effective, &state);

    let text = render_text(schema.title(), &rendered);
    assert!(text.starts_with("Form: Inventory item"));
    assert!(text.contains("sku [text_input] SKU (disabled)"));

    let ui = render_json_ui(schema.id(), schema.title(), &rendered);
    assert_eq!(ui["form_id"], "inventory");
    let fields = ui["fields"].as_array().expect("fields");
    assert_eq!(fields.len(), 3);
    assert!(fields.iter().all(|field| field["disabled"] == json!(true)));
}
