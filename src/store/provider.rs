use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::Display;

use super::category::{Category, FieldKind};
use super::{MemStore, Record, StoreResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PricingModel {
    #[default]
    PayPerUse,
    Subscription,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    #[default]
    Tokens,
    Images,
    Minutes,
}

/// The bounded, steppable usage quantity a provider is priced by.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageMetric {
    pub kind: MetricKind,
    pub label: String,
    pub default_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_default_value: Option<f64>,
    pub step: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-unit rates. `operation` is a flat rate per usage unit; `input` and
/// `output` form a split rate requiring two usage quantities. All three
/// absent means the provider has no pricing data (price resolves to 0).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitPrice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub step: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub cost_per_unit: f64,
    pub monthly_calculation: String,
    pub yearly_calculation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceDetail {
    pub name: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub provider_key: String,
    pub name: String,
    pub vendor: String,
    pub category_key: String,
    pub description: String,
    pub documentation_url: String,
    pub logo_url: String,
    pub pricing_model: PricingModel,
    pub featured: bool,
    pub usage_metric: UsageMetric,
    pub price_per_unit: UnitPrice,
    pub sliders: Vec<Slider>,
    pub outputs: Vec<Output>,
    pub price_details: Vec<PriceDetail>,
    pub custom_fields: Vec<CustomField>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Provider {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Deserialize)]
pub struct NewProvider {
    pub id: i64,
    pub provider_key: String,
    pub name: String,
    pub vendor: String,
    pub category_key: String,
    pub description: String,
    pub documentation_url: String,
    pub logo_url: String,
    pub pricing_model: PricingModel,
    pub featured: bool,
    pub usage_metric: UsageMetric,
    pub price_per_unit: UnitPrice,
    pub sliders: Vec<Slider>,
    pub outputs: Vec<Output>,
    pub price_details: Vec<PriceDetail>,
    pub custom_fields: Vec<CustomField>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProviderData {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub category_key: Option<String>,
    pub description: Option<String>,
    pub documentation_url: Option<String>,
    pub logo_url: Option<String>,
    pub pricing_model: Option<PricingModel>,
    pub featured: Option<bool>,
    pub usage_metric: Option<UsageMetric>,
    pub price_per_unit: Option<UnitPrice>,
    pub sliders: Option<Vec<Slider>>,
    pub outputs: Option<Vec<Output>>,
    pub price_details: Option<Vec<PriceDetail>>,
    pub custom_fields: Option<Vec<CustomField>>,
}

#[derive(Default)]
pub struct ProviderStore {
    inner: MemStore<Provider>,
}

impl ProviderStore {
    pub fn new() -> Self {
        Self {
            inner: MemStore::new(),
        }
    }

    pub fn create(&self, data: NewProvider) -> StoreResult<Provider> {
        self.inner.insert(Provider {
            id: data.id,
            provider_key: data.provider_key,
            name: data.name,
            vendor: data.vendor,
            category_key: data.category_key,
            description: data.description,
            documentation_url: data.documentation_url,
            logo_url: data.logo_url,
            pricing_model: data.pricing_model,
            featured: data.featured,
            usage_metric: data.usage_metric,
            price_per_unit: data.price_per_unit,
            sliders: data.sliders,
            outputs: data.outputs,
            price_details: data.price_details,
            custom_fields: data.custom_fields,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Applies the optional fields of `data`; when the category changes the
    /// caller is expected to have re-seeded the template shapes into `data`.
    pub fn update(&self, id: i64, data: &UpdateProviderData, now: i64) -> StoreResult<Provider> {
        self.inner.update_with(id, |provider| {
            if let Some(name) = &data.name {
                provider.name = name.clone();
            }
            if let Some(vendor) = &data.vendor {
                provider.vendor = vendor.clone();
            }
            if let Some(category_key) = &data.category_key {
                provider.category_key = category_key.clone();
            }
            if let Some(description) = &data.description {
                provider.description = description.clone();
            }
            if let Some(documentation_url) = &data.documentation_url {
                provider.documentation_url = documentation_url.clone();
            }
            if let Some(logo_url) = &data.logo_url {
                provider.logo_url = logo_url.clone();
            }
            if let Some(pricing_model) = data.pricing_model {
                provider.pricing_model = pricing_model;
            }
            if let Some(featured) = data.featured {
                provider.featured = featured;
            }
            if let Some(usage_metric) = &data.usage_metric {
                provider.usage_metric = usage_metric.clone();
            }
            if let Some(price_per_unit) = data.price_per_unit {
                provider.price_per_unit = price_per_unit;
            }
            if let Some(sliders) = &data.sliders {
                provider.sliders = sliders.clone();
            }
            if let Some(outputs) = &data.outputs {
                provider.outputs = outputs.clone();
            }
            if let Some(price_details) = &data.price_details {
                provider.price_details = price_details.clone();
            }
            if let Some(custom_fields) = &data.custom_fields {
                provider.custom_fields = custom_fields.clone();
            }
            provider.updated_at = now;
        })
    }

    pub fn set_featured(&self, id: i64, featured: bool, now: i64) -> StoreResult<Provider> {
        self.inner.update_with(id, |provider| {
            provider.featured = featured;
            provider.updated_at = now;
        })
    }

    pub fn delete(&self, id: i64) -> StoreResult<Provider> {
        self.inner.remove(id)
    }

    pub fn get_by_id(&self, id: i64) -> StoreResult<Provider> {
        self.inner.get_by_id(id)
    }

    pub fn get_by_key(&self, key: &str) -> StoreResult<Option<Provider>> {
        self.inner.find(|provider| provider.provider_key == key)
    }

    /// Catalog order: insertion order, which doubles as the `recent` sort.
    pub fn list_all(&self) -> StoreResult<Vec<Provider>> {
        self.inner.list_all()
    }

    pub fn count_by_category(&self, category_key: &str) -> StoreResult<usize> {
        self.inner
            .count(|provider| provider.category_key == category_key)
    }

    /// Seeds a provider's configurable shapes from a category template.
    pub fn apply_category_template(provider: &mut NewProvider, category: &Category) {
        provider.sliders = category.seed_sliders();
        provider.outputs = category.seed_outputs();
        provider.price_details = category.seed_price_details();
    }
}
