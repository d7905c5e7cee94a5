use bigdecimal::BigDecimal;
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    app::error::{AppError, FieldError},
    models::{Category, CreateProductEntity, ProductEntity, UpdateProductEntity},
    store::{Store, StoreError},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    Vegetable,
    Fruit,
}

impl CategoryFilter {
    pub fn category(self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Vegetable => Some(Category::Vegetable),
            CategoryFilter::Fruit => Some(Category::Fruit),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid product")]
    Invalid(Vec<FieldError>),

    #[error("Product not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Invalid(errors) => AppError::Validation(errors),
            CatalogError::NotFound => AppError::NotFound,
            CatalogError::Store(err) => err.into(),
        }
    }
}

/// Largest price a `NUMERIC(10,2)` column holds, plus one cent.
fn price_ceiling() -> BigDecimal {
    BigDecimal::from(100_000_000)
}

fn price_floor() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

fn check_price(price: &BigDecimal, errors: &mut Vec<FieldError>) -> BigDecimal {
    let price = price.round(2);
    if price < price_floor() {
        errors.push(FieldError::new("price", "Price must be at least 0.01"));
    } else if price >= price_ceiling() {
        errors.push(FieldError::new("price", "Price is too large"));
    }
    price
}

fn check_required(field: &str, label: &str, value: &str, errors: &mut Vec<FieldError>) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, &format!("{} is required", label)));
    }
    value.to_string()
}

/// Fields of a new product, as submitted by an admin.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductForm {
    pub name: String,
    #[schema(value_type = String, example = "2.99")]
    pub price: BigDecimal,
    pub image_url: String,
    pub description: String,
    pub category: Category,
}

impl ProductForm {
    pub fn validate(&self) -> Result<CreateProductEntity, Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = check_required("name", "Name", &self.name, &mut errors);
        let price = check_price(&self.price, &mut errors);
        let image_url = check_required("image_url", "Image URL", &self.image_url, &mut errors);
        let description =
            check_required("description", "Description", &self.description, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CreateProductEntity {
            name,
            price,
            image_url,
            description,
            category: self.category,
        })
    }
}

/// Partial product update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductPatch {
    pub name: Option<String>,
    #[schema(value_type = Option<String>, example = "3.49")]
    pub price: Option<BigDecimal>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<UpdateProductEntity, Vec<FieldError>> {
        let mut errors = Vec::new();
        let changes = UpdateProductEntity {
            name: self
                .name
                .as_deref()
                .map(|name| check_required("name", "Name", name, &mut errors)),
            price: self
                .price
                .as_ref()
                .map(|price| check_price(price, &mut errors)),
            image_url: self
                .image_url
                .as_deref()
                .map(|url| check_required("image_url", "Image URL", url, &mut errors)),
            description: self.description.as_deref().map(|description| {
                check_required("description", "Description", description, &mut errors)
            }),
            category: self.category,
        };

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }
}

pub async fn list_products(
    store: &impl Store,
    filter: CategoryFilter,
) -> Result<Vec<ProductEntity>, CatalogError> {
    Ok(store.list_products(filter.category()).await?)
}

pub async fn get_product(store: &impl Store, id: i32) -> Result<ProductEntity, CatalogError> {
    store
        .find_product(id)
        .await?
        .ok_or(CatalogError::NotFound)
}

pub async fn create_product(
    store: &impl Store,
    form: &ProductForm,
) -> Result<ProductEntity, CatalogError> {
    let product = form.validate().map_err(CatalogError::Invalid)?;
    let created = store.create_product(product).await?;
    tracing::info!("Created product {} ({})", created.id, created.name);
    Ok(created)
}

pub async fn update_product(
    store: &impl Store,
    id: i32,
    patch: &ProductPatch,
) -> Result<ProductEntity, CatalogError> {
    let changes = patch.validate().map_err(CatalogError::Invalid)?;
    if changes.is_empty() {
        return get_product(store, id).await;
    }

    let updated = store
        .update_product(id, changes)
        .await?
        .ok_or(CatalogError::NotFound)?;
    tracing::info!("Updated product {}", updated.id);
    Ok(updated)
}

pub async fn delete_product(store: &impl Store, id: i32) -> Result<(), CatalogError> {
    if !store.delete_product(id).await? {
        return Err(CatalogError::NotFound);
    }
    tracing::info!("Deleted product {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use axum::http::StatusCode;

    use super::*;
    use crate::app::error::{RETRY_LATER, rendered};

    fn dec(raw: &str) -> BigDecimal {
        BigDecimal::from_str(raw).unwrap()
    }

    fn form() -> ProductForm {
        ProductForm {
            name: "  Fresh Apples ".into(),
            price: dec("2.994"),
            image_url: "https://images.example.com/apples.jpeg".into(),
            description: "Crisp and sweet".into(),
            category: Category::Fruit,
        }
    }

    #[test]
    fn valid_form_is_trimmed_and_rounded() {
        let product = form().validate().unwrap();
        assert_eq!(product.name, "Fresh Apples");
        assert_eq!(product.price, dec("2.99"));
    }

    #[test]
    fn form_reports_every_bad_field() {
        let errors = ProductForm {
            name: " ".into(),
            price: dec("0.001"),
            image_url: String::new(),
            description: "ok".into(),
            category: Category::Vegetable,
        }
        .validate()
        .unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "price", "image_url"]);
        assert_eq!(errors[1].message, "Price must be at least 0.01");
    }

    #[test]
    fn oversized_prices_are_rejected() {
        let errors = ProductForm {
            price: dec("100000000"),
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("price", "Price is too large")]);
    }

    #[test]
    fn patch_only_checks_present_fields() {
        let changes = ProductPatch {
            price: Some(dec("3.49")),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.price, Some(dec("3.49")));
        assert!(changes.name.is_none());

        let errors = ProductPatch {
            description: Some("".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("description", "Description is required")]
        );
    }

    #[test]
    fn category_filter_maps_to_categories() {
        assert_eq!(CategoryFilter::All.category(), None);
        assert_eq!(CategoryFilter::Fruit.category(), Some(Category::Fruit));
        let parsed: CategoryFilter = serde_json::from_str(r#""vegetable""#).unwrap();
        assert_eq!(parsed, CategoryFilter::Vegetable);
    }

    #[tokio::test]
    async fn catalog_failures_map_to_http_answers() {
        let (status, body) =
            rendered(CatalogError::Invalid(vec![FieldError::new("name", "Name is required")]))
                .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["data"][0]["field"], "name");

        let (status, _) = rendered(CatalogError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            rendered(CatalogError::Store(StoreError::Pool("timed out".into()))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], RETRY_LATER);
    }
}
