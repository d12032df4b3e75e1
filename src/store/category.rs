use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{Output, PriceDetail, Slider};
use super::{MemStore, Record, StoreResult};

/// Value type of a price-detail or custom field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
}

impl FieldKind {
    fn zero_value(&self) -> Value {
        match self {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::Number => Value::from(0),
            FieldKind::Boolean => Value::Bool(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliderDefinition {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputDefinition {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceDetailField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub description: String,
}

/// Schema template describing which sliders, outputs and price-detail
/// fields a class of providers supports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub category_key: String,
    pub name: String,
    pub slider_definitions: Vec<SliderDefinition>,
    pub output_definitions: Vec<OutputDefinition>,
    pub price_detail_fields: Vec<PriceDetailField>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Category {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Category {
    /// Zeroed slider set matching this template, applied when a provider
    /// is assigned to the category.
    pub fn seed_sliders(&self) -> Vec<Slider> {
        self.slider_definitions
            .iter()
            .map(|def| Slider {
                name: def.name.clone(),
                min_value: 0.0,
                max_value: 0.0,
                step: 0.0,
            })
            .collect()
    }

    pub fn seed_outputs(&self) -> Vec<Output> {
        self.output_definitions
            .iter()
            .map(|def| Output {
                name: def.name.clone(),
                cost_per_unit: 0.0,
                monthly_calculation: String::new(),
                yearly_calculation: String::new(),
            })
            .collect()
    }

    pub fn seed_price_details(&self) -> Vec<PriceDetail> {
        self.price_detail_fields
            .iter()
            .map(|field| PriceDetail {
                name: field.name.clone(),
                value: field.kind.zero_value(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub id: i64,
    pub category_key: String,
    pub name: String,
    pub slider_definitions: Vec<SliderDefinition>,
    pub output_definitions: Vec<OutputDefinition>,
    pub price_detail_fields: Vec<PriceDetailField>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryData {
    pub name: Option<String>,
    pub slider_definitions: Option<Vec<SliderDefinition>>,
    pub output_definitions: Option<Vec<OutputDefinition>>,
    pub price_detail_fields: Option<Vec<PriceDetailField>>,
}

#[derive(Default)]
pub struct CategoryStore {
    inner: MemStore<Category>,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self {
            inner: MemStore::new(),
        }
    }

    pub fn create(&self, data: NewCategory) -> StoreResult<Category> {
        self.inner.insert(Category {
            id: data.id,
            category_key: data.category_key,
            name: data.name,
            slider_definitions: data.slider_definitions,
            output_definitions: data.output_definitions,
            price_detail_fields: data.price_detail_fields,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    pub fn update(&self, id: i64, data: &UpdateCategoryData, now: i64) -> StoreResult<Category> {
        self.inner.update_with(id, |category| {
            if let Some(name) = &data.name {
                category.name = name.clone();
            }
            if let Some(defs) = &data.slider_definitions {
                category.slider_definitions = defs.clone();
            }
            if let Some(defs) = &data.output_definitions {
                category.output_definitions = defs.clone();
            }
            if let Some(fields) = &data.price_detail_fields {
                category.price_detail_fields = fields.clone();
            }
            category.updated_at = now;
        })
    }

    pub fn delete(&self, id: i64) -> StoreResult<Category> {
        self.inner.remove(id)
    }

    pub fn get_by_id(&self, id: i64) -> StoreResult<Category> {
        self.inner.get_by_id(id)
    }

    pub fn get_by_key(&self, key: &str) -> StoreResult<Option<Category>> {
        self.inner.find(|category| category.category_key == key)
    }

    pub fn list_all(&self) -> StoreResult<Vec<Category>> {
        self.inner.list_all()
    }
}
