use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    collection::FromDocument,
    error::{AppError, AppResult},
    image::{DownscaledImage, PLACEHOLDER_IMAGE},
    models::Product,
    store::{Document, PRODUCTS, StoreClient},
};

/// A form value as submitted: text from an HTML form or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FormValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Raw admin product form. Nothing here has been checked yet.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<FormValue>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub stock: Option<FormValue>,
}

/// Highest price the admin form accepts, in store currency units.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedProduct {
    pub name: String,
    pub price: i64,
    pub category: String,
    /// `None` when the form left the field out.
    pub description: Option<String>,
    pub stock: i32,
}

impl ProductForm {
    pub fn validate(&self) -> AppResult<ValidatedProduct> {
        let name = required_text("name", self.name.as_deref())?;
        let category = required_text("category", self.category.as_deref())?;
        let price = parse_whole("price", self.price.as_ref())?;
        if price > MAX_PRICE {
            return Err(AppError::Validation(format!(
                "price cannot exceed {MAX_PRICE}"
            )));
        }
        let stock = parse_whole("stock", self.stock.as_ref())?;
        let stock = i32::try_from(stock)
            .map_err(|_| AppError::Validation("stock is too large".into()))?;

        Ok(ValidatedProduct {
            name,
            price,
            category,
            description: self
                .description
                .as_deref()
                .map(|d| d.trim().to_string()),
            stock,
        })
    }
}

fn required_text(field: &str, value: Option<&str>) -> AppResult<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

/// Coerces a form value to a non-negative whole number.
fn parse_whole(field: &str, value: Option<&FormValue>) -> AppResult<i64> {
    let number = match value {
        None => return Err(AppError::Validation(format!("{field} is required"))),
        Some(FormValue::Int(n)) => *n,
        Some(FormValue::Float(f)) if f.fract() == 0.0 && f.is_finite() => *f as i64,
        Some(FormValue::Float(_)) => {
            return Err(AppError::Validation(format!("{field} must be a whole number")));
        }
        Some(FormValue::Text(text)) if text.trim().is_empty() => {
            return Err(AppError::Validation(format!("{field} is required")));
        }
        Some(FormValue::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("{field} must be a whole number")))?,
    };

    if number < 0 {
        return Err(AppError::Validation(format!("{field} cannot be negative")));
    }
    Ok(number)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductFields {
    name: String,
    price: i64,
    category: String,
    description: String,
    image: String,
    stock: i32,
}

impl FromDocument for Product {
    fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: ProductFields = serde_json::from_value(doc.data.clone())?;
        Ok(Product {
            id: doc.id,
            name: fields.name,
            price: fields.price,
            category: fields.category,
            description: fields.description,
            image: fields.image,
            stock: fields.stock,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

/// Admin-side create, edit and delete of catalog entries.
pub struct ProductService<'a> {
    client: &'a StoreClient,
}

impl<'a> ProductService<'a> {
    pub fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// Creates a product, or edits `existing` when given. The image is the
    /// new attachment if any, else the product's current image, else the
    /// placeholder. Fields outside the form, and a description the form
    /// omits, are left untouched on edit.
    pub async fn submit_product(
        &self,
        form: &ProductForm,
        image: Option<DownscaledImage>,
        existing: Option<&Product>,
    ) -> AppResult<Uuid> {
        let product = form.validate()?;
        let image = match (image, existing) {
            (Some(image), _) => image.into_uri(),
            (None, Some(existing)) => existing.image.clone(),
            (None, None) => PLACEHOLDER_IMAGE.to_string(),
        };

        let mut data = json!({
            "name": product.name,
            "price": product.price,
            "category": product.category,
            "image": image,
            "stock": product.stock,
        });
        // An edit only touches the description when the form carries one.
        match (product.description, existing) {
            (Some(description), _) => data["description"] = json!(description),
            (None, None) => data["description"] = json!(""),
            (None, Some(_)) => {}
        }

        match existing {
            Some(existing) => {
                self.client.update(PRODUCTS, existing.id, data).await?;
                tracing::info!(product_id = %existing.id, "product updated");
                Ok(existing.id)
            }
            None => {
                let id = self.client.create(PRODUCTS, data).await?;
                tracing::info!(product_id = %id, "product created");
                Ok(id)
            }
        }
    }

    /// Removes a product for good. Orders keep their own copy of the item,
    /// so nothing cascades.
    pub async fn delete_product(&self, id: Uuid, confirmed: bool) -> AppResult<()> {
        if !confirmed {
            return Err(AppError::Validation(
                "deleting a product must be confirmed".into(),
            ));
        }
        self.client.delete(PRODUCTS, id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

pub fn find_product(catalog: &[Product], id: Uuid) -> Option<&Product> {
    catalog.iter().find(|product| product.id == id)
}
