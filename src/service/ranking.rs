//! Filter/sort engine: combines the provider catalog, the active filters
//! and the debounced usage snapshot into the final ordered list. Fully
//! recomputed on every query; an empty result is a valid state, not an
//! error.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::store::provider::Provider;

use super::pricing::{self, OutputFallback};
use super::usage::UsageSnapshot;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortKey {
    Featured,
    Recent,
    #[default]
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
}

fn matches_filters(provider: &Provider, query: &CatalogQuery) -> bool {
    let matches_category = query
        .category
        .as_deref()
        .is_none_or(|category| provider.category_key == category);

    let matches_vendor = query
        .vendor
        .as_deref()
        .is_none_or(|vendor| provider.vendor == vendor);

    let matches_search = query.search.as_deref().is_none_or(|search| {
        let needle = search.to_lowercase();
        provider.name.to_lowercase().contains(&needle)
            || provider.description.to_lowercase().contains(&needle)
    });

    matches_category && matches_vendor && matches_search
}

/// Filters and orders the catalog. While any usage slider is active,
/// sorting is suspended entirely and the filtered list keeps its natural
/// (insertion) order, so price reordering does not fight a live drag.
pub fn filter_and_sort(
    providers: Vec<Provider>,
    query: &CatalogQuery,
    ranking: &UsageSnapshot,
    sliders_active: bool,
) -> Vec<Provider> {
    let mut filtered: Vec<Provider> = providers
        .into_iter()
        .filter(|provider| matches_filters(provider, query))
        .collect();

    if sliders_active {
        return filtered;
    }

    match query.sort {
        SortKey::Featured => {
            filtered.sort_by_key(|provider| !provider.featured);
        }
        // Catalog insertion order already reflects recency.
        SortKey::Recent => {}
        SortKey::PriceAsc | SortKey::PriceDesc => {
            let mut priced: Vec<(f64, Provider)> = filtered
                .into_iter()
                .map(|provider| {
                    let price =
                        pricing::monthly_price(&provider, ranking, OutputFallback::RankingEstimate);
                    (price, provider)
                })
                .collect();
            priced.sort_by(|a, b| a.0.total_cmp(&b.0));
            if query.sort == SortKey::PriceDesc {
                priced.reverse();
            }
            filtered = priced.into_iter().map(|(_, provider)| provider).collect();
        }
        SortKey::NameAsc => {
            filtered.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
        SortKey::NameDesc => {
            filtered.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase()));
        }
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::provider::{
        MetricKind, PricingModel, UnitPrice, UsageMetric,
    };

    fn provider(id: i64, name: &str, category: &str, price_per_unit: UnitPrice, default_value: f64) -> Provider {
        Provider {
            id,
            provider_key: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            vendor: "Vendor".to_string(),
            category_key: category.to_string(),
            description: format!("{} description", name),
            documentation_url: String::new(),
            logo_url: String::new(),
            pricing_model: PricingModel::PayPerUse,
            featured: false,
            usage_metric: UsageMetric {
                kind: MetricKind::Tokens,
                label: "Monthly Tokens".to_string(),
                default_value,
                output_default_value: None,
                step: 1000.0,
                min: 0.0,
                max: 10_000_000.0,
            },
            price_per_unit,
            sliders: Vec::new(),
            outputs: Vec::new(),
            price_details: Vec::new(),
            custom_fields: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn sample_catalog() -> Vec<Provider> {
        vec![
            // A: operation rate 0.02, default usage 100 -> monthly 2.00
            provider(
                1,
                "Alpha",
                "image-generation",
                UnitPrice {
                    operation: Some(0.02),
                    ..Default::default()
                },
                100.0,
            ),
            // B: split rate, defaults 1M input / 800k output -> monthly 78,000
            provider(
                2,
                "Beta",
                "text-generation",
                UnitPrice {
                    input: Some(0.03),
                    output: Some(0.06),
                    ..Default::default()
                },
                1_000_000.0,
            ),
        ]
    }

    #[test]
    fn test_price_asc_orders_by_computed_price() {
        let query = CatalogQuery {
            sort: SortKey::PriceAsc,
            ..Default::default()
        };
        let result = filter_and_sort(sample_catalog(), &query, &UsageSnapshot::default(), false);
        let names: Vec<&str> = result.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);

        let query = CatalogQuery {
            sort: SortKey::PriceDesc,
            ..Default::default()
        };
        let result = filter_and_sort(sample_catalog(), &query, &UsageSnapshot::default(), false);
        let names: Vec<&str> = result.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }

    #[test]
    fn test_sorting_suspended_while_sliders_active() {
        let query = CatalogQuery {
            sort: SortKey::NameDesc,
            ..Default::default()
        };
        let result = filter_and_sort(sample_catalog(), &query, &UsageSnapshot::default(), true);
        let names: Vec<&str> = result.iter().map(|p| p.name.as_str()).collect();
        // Natural order regardless of the selected sort key.
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let query = CatalogQuery {
            category: Some("text-generation".to_string()),
            search: Some("beta".to_string()),
            ..Default::default()
        };
        let result = filter_and_sort(sample_catalog(), &query, &UsageSnapshot::default(), false);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Beta");

        let query = CatalogQuery {
            category: Some("text-generation".to_string()),
            search: Some("alpha".to_string()),
            ..Default::default()
        };
        let result = filter_and_sort(sample_catalog(), &query, &UsageSnapshot::default(), false);
        assert!(result.is_empty());
    }

    #[test]
    fn test_search_matches_name_or_description_case_insensitive() {
        let query = CatalogQuery {
            search: Some("ALPHA DESCRIPTION".to_string()),
            ..Default::default()
        };
        let result = filter_and_sort(sample_catalog(), &query, &UsageSnapshot::default(), false);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_featured_sort_is_stable_featured_first() {
        let mut catalog = sample_catalog();
        catalog[1].featured = true;
        let query = CatalogQuery {
            sort: SortKey::Featured,
            ..Default::default()
        };
        let result = filter_and_sort(catalog, &query, &UsageSnapshot::default(), false);
        let names: Vec<&str> = result.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }

    #[test]
    fn test_name_sort() {
        let query = CatalogQuery {
            sort: SortKey::NameDesc,
            ..Default::default()
        };
        let result = filter_and_sort(sample_catalog(), &query, &UsageSnapshot::default(), false);
        let names: Vec<&str> = result.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }
}
