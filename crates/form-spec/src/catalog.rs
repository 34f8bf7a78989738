//! Built-in schemas for the seller and admin panel entities.

use std::sync::LazyLock;

use serde_json::json;
use thiserror::Error;

use crate::error::SchemaIntegrityError;
use crate::expr::Predicate;
use crate::mode::Mode;
use crate::spec::field::{FieldDescriptor, FieldKind};
use crate::spec::schema::FormSchema;
use crate::validate::Rule;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
    #[error(transparent)]
    Integrity(#[from] SchemaIntegrityError),
}

type Entry = LazyLock<Result<FormSchema, SchemaIntegrityError>>;

static BRAND: Entry = LazyLock::new(brand);
static PRODUCT: Entry = LazyLock::new(product);
static SURVEY: Entry = LazyLock::new(survey);
static COUPON: Entry = LazyLock::new(coupon);

const ENTITIES: [&str; 4] = ["brand", "product", "survey", "coupon"];

pub fn entities() -> &'static [&'static str] {
    &ENTITIES
}

/// Looks up a built-in schema; each is assembled once, on first use.
pub fn get(entity: &str) -> Result<&'static FormSchema, CatalogError> {
    let entry: &'static Entry = match entity {
        "brand" => &BRAND,
        "product" => &PRODUCT,
        "survey" => &SURVEY,
        "coupon" => &COUPON,
        other => return Err(CatalogError::UnknownEntity(other.to_string())),
    };
    LazyLock::force(entry)
        .as_ref()
        .map_err(|err| CatalogError::Integrity(err.clone()))
}

fn company_field() -> FieldDescriptor {
    FieldDescriptor::new("company_id", "Company", FieldKind::Text)
        .required()
        .disabled_when(Predicate::Literal { value: true })
}

fn publication_status() -> FieldKind {
    FieldKind::select([
        ("Draft", "draft"),
        ("Published", "published"),
        ("Archived", "archived"),
    ])
}

fn brand() -> Result<FormSchema, SchemaIntegrityError> {
    FormSchema::builder("brand", "Brand")
        .description("Brand shown on the storefront and in product listings.")
        .field(
            FieldDescriptor::new("name", "Brand name", FieldKind::Text)
                .required()
                .placeholder("e.g. Acme")
                .validation("name"),
        )
        .field(
            FieldDescriptor::new("slug", "Slug", FieldKind::Text)
                .required()
                .placeholder("acme")
                .validation("slug")
                .disabled_when(Predicate::mode_is(Mode::Edit)),
        )
        .field(FieldDescriptor::new(
            "description",
            "Description",
            FieldKind::TextArea { auto_resize: true },
        ))
        .field(FieldDescriptor::new(
            "logo",
            "Logo",
            FieldKind::File {
                accept: vec!["image/png".into(), "image/jpeg".into(), "image/svg+xml".into()],
                multiple: false,
            },
        ))
        .field(FieldDescriptor::new("website", "Website", FieldKind::Text).validation("url"))
        .field(FieldDescriptor::new("status", "Status", publication_status()).required())
        .default("status", "draft")
        .field(company_field())
        .rule("name", Rule::length(Some(2), Some(80)))
        .rule(
            "slug",
            Rule::pattern("^[a-z0-9]+(?:-[a-z0-9]+)*$")
                .with_message("use lower-case letters, digits and dashes"),
        )
        .rule("url", Rule::pattern("^https?://"))
        .build()
}

fn product() -> Result<FormSchema, SchemaIntegrityError> {
    FormSchema::builder("product", "Product")
        .field(
            FieldDescriptor::new("name", "Product name", FieldKind::Text)
                .required()
                .validation("name"),
        )
        .field(
            FieldDescriptor::new("sku", "SKU", FieldKind::Text)
                .required()
                .validation("sku")
                .disabled_when(Predicate::mode_is(Mode::Edit)),
        )
        .field(FieldDescriptor::new(
            "description",
            "Description",
            FieldKind::TextArea { auto_resize: true },
        ))
        .field(FieldDescriptor::new(
            "currency",
            "Currency",
            FieldKind::select([("US Dollar", "USD"), ("Euro", "EUR"), ("Rupiah", "IDR")]),
        ))
        .default("currency", "USD")
        .field(
            FieldDescriptor::new("price", "Price ({{currency}})", FieldKind::Number)
                .required()
                .validation("non_negative"),
        )
        .field(
            FieldDescriptor::new("stock", "Stock", FieldKind::Number).validation("non_negative"),
        )
        .default("stock", 0)
        .field(FieldDescriptor::new(
            "tags",
            "Tags",
            FieldKind::MultiSelect {
                options: ["new", "sale", "bestseller", "limited"]
                    .into_iter()
                    .map(|tag| crate::spec::field::SelectOption::new(tag, tag))
                    .collect(),
            },
        ))
        .field(FieldDescriptor::new(
            "images",
            "Images",
            FieldKind::File {
                accept: vec!["image/*".into()],
                multiple: true,
            },
        ))
        .field(FieldDescriptor::new("has_variants", "Has variants", FieldKind::Boolean))
        .field(
            FieldDescriptor::new(
                "variants",
                "Variants",
                FieldKind::NestedArray {
                    fields: vec![
                        FieldDescriptor::new("name", "Variant name", FieldKind::Text).required(),
                        FieldDescriptor::new("sku", "Variant SKU", FieldKind::Text)
                            .validation("sku"),
                        FieldDescriptor::new("price", "Price", FieldKind::Number)
                            .validation("non_negative"),
                    ],
                    min_items: None,
                    max_items: Some(50),
                },
            )
            .visible_when(Predicate::truthy("has_variants")),
        )
        .field(FieldDescriptor::new("status", "Status", publication_status()).required())
        .default("status", "draft")
        .field(company_field())
        .rule("name", Rule::length(Some(2), Some(120)))
        .rule(
            "sku",
            Rule::pattern("^[A-Z0-9][A-Z0-9-]{2,31}$")
                .with_message("use 3-32 upper-case letters, digits or dashes"),
        )
        .rule("non_negative", Rule::range(Some(0.0), None))
        .build()
}

fn survey() -> Result<FormSchema, SchemaIntegrityError> {
    FormSchema::builder("survey", "Survey")
        .field(
            FieldDescriptor::new("title", "Survey title", FieldKind::Text)
                .required()
                .validation("title"),
        )
        .field(FieldDescriptor::new(
            "description",
            "Description",
            FieldKind::TextArea { auto_resize: true },
        ))
        .field(FieldDescriptor::new("start_date", "Starts on", FieldKind::Date).required())
        .field(
            FieldDescriptor::new("end_date", "Ends on", FieldKind::Date)
                .required_when(Predicate::field_eq("status", "published")),
        )
        .field(FieldDescriptor::new("anonymous", "Anonymous answers", FieldKind::Boolean))
        .field(FieldDescriptor::new(
            "questions",
            "Questions",
            FieldKind::NestedArray {
                fields: vec![
                    FieldDescriptor::new("question", "Question", FieldKind::Text).required(),
                    FieldDescriptor::new(
                        "answer_type",
                        "Answer type",
                        FieldKind::select([
                            ("Free text", "text"),
                            ("Rating", "rating"),
                            ("Single choice", "choice"),
                        ]),
                    )
                    .required(),
                    FieldDescriptor::new(
                        "choices",
                        "Choices (one per line)",
                        FieldKind::TextArea { auto_resize: true },
                    ),
                ],
                min_items: Some(1),
                max_items: Some(30),
            },
        ))
        .default("questions", json!([{ "question": "", "answer_type": "text", "choices": "" }]))
        .field(FieldDescriptor::new("status", "Status", publication_status()).required())
        .default("status", "draft")
        .field(company_field())
        .rule("title", Rule::length(Some(3), Some(150)))
        .build()
}

fn coupon() -> Result<FormSchema, SchemaIntegrityError> {
    FormSchema::builder("coupon", "Coupon")
        .field(
            FieldDescriptor::new("code", "Coupon code", FieldKind::Text)
                .required()
                .placeholder("SUMMER24")
                .validation("code")
                .disabled_when(Predicate::mode_is(Mode::Edit)),
        )
        .field(
            FieldDescriptor::new(
                "discount_type",
                "Discount type",
                FieldKind::select([("Percentage", "percentage"), ("Fixed amount", "fixed")]),
            )
            .required(),
        )
        .default("discount_type", "percentage")
        .field(
            FieldDescriptor::new("discount_value", "Discount value", FieldKind::Number)
                .required()
                .validation("positive"),
        )
        .field(
            FieldDescriptor::new("max_discount", "Maximum discount", FieldKind::Number)
                .validation("positive")
                .visible_when(Predicate::field_eq("discount_type", "percentage")),
        )
        .field(
            FieldDescriptor::new("min_order_amount", "Minimum order amount", FieldKind::Number)
                .validation("non_negative"),
        )
        .field(FieldDescriptor::new("valid_from", "Valid from", FieldKind::Date).required())
        .field(FieldDescriptor::new("valid_until", "Valid until", FieldKind::Date).required())
        .field(
            FieldDescriptor::new("usage_limit", "Usage limit", FieldKind::Number)
                .validation("positive"),
        )
        .field(FieldDescriptor::new("active", "Active", FieldKind::Boolean))
        .default("active", true)
        .field(company_field())
        .rule(
            "code",
            Rule::pattern("^[A-Z0-9]{4,16}$").with_message("use 4-16 upper-case letters or digits"),
        )
        .rule("positive", Rule::range(Some(1.0), None))
        .rule("non_negative", Rule::range(Some(0.0), None))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_schema_is_consistent() {
        for entity in entities() {
            let schema = get(entity).expect("builtin schema");
            assert_eq!(schema.id(), *entity);
            assert_eq!(
                schema.default_values().len(),
                schema.fields().len(),
                "{} defaults",
                entity
            );
        }
    }

    #[test]
    fn lookups_share_one_instance() {
        let first = get("brand").expect("brand");
        let second = get("brand").expect("brand");
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn unknown_entity() {
        assert_eq!(
            get("invoice").expect_err("unknown"),
            CatalogError::UnknownEntity("invoice".into())
        );
    }
}
