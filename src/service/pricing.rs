//! Pricing engine: maps a provider and the current usage values to monthly
//! and yearly cost figures. Pure functions; every input combination has a
//! defined fallback, so there is no error path.

use std::collections::HashMap;

use serde::Serialize;

use crate::store::provider::Provider;

use super::formula;
use super::usage::UsageSnapshot;

/// How to fill in the output usage quantity when a split-rate provider has
/// none. The two call sites intentionally disagree: the ranking path
/// assumes output runs at 80 % of input, the interactive display falls back
/// to the metric's configured output default. Collapsing them would change
/// observable sort order versus displayed price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputFallback {
    /// Batch filter/sort path: `floor(input * 0.8)`.
    RankingEstimate,
    /// Interactive display path: global output slider, then the metric's
    /// output default, then the input default.
    DisplayDefault,
}

fn effective_rate(rate: Option<f64>) -> Option<f64> {
    rate.filter(|value| *value != 0.0)
}

/// Resolution order, highest precedence first: per-provider override,
/// global usage slider, the provider's configured default.
pub fn resolve_input_usage(provider: &Provider, snapshot: &UsageSnapshot) -> f64 {
    snapshot
        .override_for(provider.id)
        .map(|o| o.input)
        .or(snapshot.global_input)
        .unwrap_or(provider.usage_metric.default_value)
}

fn resolve_output_usage(
    provider: &Provider,
    snapshot: &UsageSnapshot,
    input_usage: f64,
    fallback: OutputFallback,
) -> f64 {
    let override_output = snapshot
        .override_for(provider.id)
        .and_then(|o| o.output);

    match fallback {
        OutputFallback::RankingEstimate => {
            override_output.unwrap_or_else(|| (input_usage * 0.8).floor())
        }
        OutputFallback::DisplayDefault => override_output
            .or(snapshot.global_output)
            .or(provider.usage_metric.output_default_value)
            .unwrap_or(provider.usage_metric.default_value),
    }
}

/// Monthly price for a provider under the given usage values.
pub fn monthly_price(provider: &Provider, snapshot: &UsageSnapshot, fallback: OutputFallback) -> f64 {
    let usage = resolve_input_usage(provider, snapshot);

    if let Some(rate) = effective_rate(provider.price_per_unit.operation) {
        return usage * rate;
    }

    if let (Some(input_rate), Some(output_rate)) = (
        effective_rate(provider.price_per_unit.input),
        effective_rate(provider.price_per_unit.output),
    ) {
        let output_usage = resolve_output_usage(provider, snapshot, usage, fallback);
        return usage * input_rate + output_usage * output_rate;
    }

    // No pricing data configured: a defined fallback, not an error.
    0.0
}

pub fn yearly_price(monthly: f64) -> f64 {
    monthly * 12.0
}

/// One evaluated output definition; `None` figures mean the formula failed
/// to evaluate and the display degrades to "—".
#[derive(Debug, Serialize)]
pub struct OutputQuote {
    pub name: String,
    pub monthly: Option<f64>,
    pub yearly: Option<f64>,
}

/// Itemized quote for the interactive display.
#[derive(Debug, Serialize)]
pub struct PriceQuote {
    pub provider_id: i64,
    pub input_usage: f64,
    pub output_usage: f64,
    pub monthly: f64,
    pub yearly: f64,
    pub outputs: Vec<OutputQuote>,
}

/// Slider values handed to output formulas: the first slider carries the
/// input usage, the second the output usage, any further sliders their
/// configured minimum.
fn slider_values(provider: &Provider, input_usage: f64, output_usage: f64) -> HashMap<String, f64> {
    let mut values: HashMap<String, f64> = provider
        .sliders
        .iter()
        .map(|slider| (slider.name.clone(), slider.min_value))
        .collect();

    if let Some(first) = provider.sliders.first() {
        values.insert(first.name.clone(), input_usage);
    }
    if let Some(second) = provider.sliders.get(1) {
        values.insert(second.name.clone(), output_usage);
    }

    values
}

/// Builds the display-path quote for a provider.
pub fn quote(provider: &Provider, snapshot: &UsageSnapshot) -> PriceQuote {
    let input_usage = resolve_input_usage(provider, snapshot);
    let output_usage =
        resolve_output_usage(provider, snapshot, input_usage, OutputFallback::DisplayDefault);
    let monthly = monthly_price(provider, snapshot, OutputFallback::DisplayDefault);

    let values = slider_values(provider, input_usage, output_usage);
    let outputs = provider
        .outputs
        .iter()
        .map(|output| OutputQuote {
            name: output.name.clone(),
            monthly: formula::evaluate(&output.monthly_calculation, &values).ok(),
            yearly: formula::evaluate(&output.yearly_calculation, &values).ok(),
        })
        .collect();

    PriceQuote {
        provider_id: provider.id,
        input_usage,
        output_usage,
        monthly,
        yearly: yearly_price(monthly),
        outputs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::usage::UsageOverride;
    use crate::store::provider::{
        MetricKind, Output, PricingModel, Slider, UnitPrice, UsageMetric,
    };

    fn provider(id: i64, price_per_unit: UnitPrice, default_value: f64) -> Provider {
        Provider {
            id,
            provider_key: format!("provider-{}", id),
            name: format!("Provider {}", id),
            vendor: "Vendor".to_string(),
            category_key: "text-generation".to_string(),
            description: String::new(),
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
            sliders: vec![
                Slider {
                    name: "Input Tokens".to_string(),
                    min_value: 0.0,
                    max_value: 10_000_000.0,
                    step: 1000.0,
                },
                Slider {
                    name: "Output Tokens".to_string(),
                    min_value: 0.0,
                    max_value: 10_000_000.0,
                    step: 1000.0,
                },
            ],
            outputs: Vec::new(),
            price_details: Vec::new(),
            custom_fields: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_operation_rate() {
        let p = provider(
            1,
            UnitPrice {
                operation: Some(0.02),
                ..Default::default()
            },
            100.0,
        );
        let snapshot = UsageSnapshot::default();

        let monthly = monthly_price(&p, &snapshot, OutputFallback::RankingEstimate);
        assert_eq!(monthly, 2.0);
        assert_eq!(yearly_price(monthly), 24.0);
    }

    #[test]
    fn test_split_rate_with_explicit_output() {
        let p = provider(
            2,
            UnitPrice {
                input: Some(0.03),
                output: Some(0.06),
                ..Default::default()
            },
            1_000_000.0,
        );
        let mut snapshot = UsageSnapshot::default();
        snapshot.overrides.insert(
            2,
            UsageOverride {
                input: 1_000_000.0,
                output: Some(800_000.0),
            },
        );

        let monthly = monthly_price(&p, &snapshot, OutputFallback::RankingEstimate);
        assert_eq!(monthly, 30_000.0 + 48_000.0);
        assert_eq!(yearly_price(monthly), 936_000.0);
    }

    #[test]
    fn test_no_pricing_data_is_zero() {
        let p = provider(3, UnitPrice::default(), 100.0);
        let snapshot = UsageSnapshot::default();
        assert_eq!(
            monthly_price(&p, &snapshot, OutputFallback::DisplayDefault),
            0.0
        );
    }

    #[test]
    fn test_usage_resolution_precedence() {
        let p = provider(
            4,
            UnitPrice {
                operation: Some(1.0),
                ..Default::default()
            },
            100.0,
        );

        let mut snapshot = UsageSnapshot::default();
        assert_eq!(resolve_input_usage(&p, &snapshot), 100.0);

        snapshot.global_input = Some(200.0);
        assert_eq!(resolve_input_usage(&p, &snapshot), 200.0);

        snapshot.overrides.insert(
            4,
            UsageOverride {
                input: 300.0,
                output: None,
            },
        );
        assert_eq!(resolve_input_usage(&p, &snapshot), 300.0);
    }

    #[test]
    fn test_ranking_fallback_is_floor_of_eighty_percent() {
        let p = provider(
            5,
            UnitPrice {
                input: Some(1.0),
                output: Some(1.0),
                ..Default::default()
            },
            101.0,
        );
        let snapshot = UsageSnapshot::default();

        // floor(101 * 0.8) = 80
        let monthly = monthly_price(&p, &snapshot, OutputFallback::RankingEstimate);
        assert_eq!(monthly, 101.0 + 80.0);
    }

    #[test]
    fn test_display_fallback_uses_configured_output_default() {
        let mut p = provider(
            6,
            UnitPrice {
                input: Some(1.0),
                output: Some(1.0),
                ..Default::default()
            },
            1000.0,
        );
        p.usage_metric.output_default_value = Some(750.0);
        let snapshot = UsageSnapshot::default();

        let monthly = monthly_price(&p, &snapshot, OutputFallback::DisplayDefault);
        assert_eq!(monthly, 1000.0 + 750.0);

        // The ranking path ignores the configured default.
        let ranked = monthly_price(&p, &snapshot, OutputFallback::RankingEstimate);
        assert_eq!(ranked, 1000.0 + 800.0);
    }

    #[test]
    fn test_display_fallback_without_output_default_uses_input_default() {
        let p = provider(
            7,
            UnitPrice {
                input: Some(1.0),
                output: Some(1.0),
                ..Default::default()
            },
            1000.0,
        );
        let snapshot = UsageSnapshot::default();

        let monthly = monthly_price(&p, &snapshot, OutputFallback::DisplayDefault);
        assert_eq!(monthly, 1000.0 + 1000.0);
    }

    #[test]
    fn test_quote_evaluates_output_formulas() {
        let mut p = provider(
            8,
            UnitPrice {
                input: Some(0.0001),
                output: Some(0.0002),
                ..Default::default()
            },
            1_000_000.0,
        );
        p.usage_metric.output_default_value = Some(800_000.0);
        p.outputs = vec![
            Output {
                name: "Input Cost".to_string(),
                cost_per_unit: 0.0001,
                monthly_calculation: "Input Tokens * 0.0001".to_string(),
                yearly_calculation: "Input Tokens * 0.0001 * 12".to_string(),
            },
            Output {
                name: "Broken".to_string(),
                cost_per_unit: 0.0,
                monthly_calculation: "Input Tokens * Unknown Thing".to_string(),
                yearly_calculation: String::new(),
            },
        ];
        let snapshot = UsageSnapshot::default();

        let quote = quote(&p, &snapshot);
        assert_eq!(quote.input_usage, 1_000_000.0);
        assert_eq!(quote.output_usage, 800_000.0);
        assert_eq!(quote.outputs[0].monthly, Some(100.0));
        assert_eq!(quote.outputs[0].yearly, Some(1200.0));
        // A broken formula degrades to None instead of failing the quote.
        assert_eq!(quote.outputs[1].monthly, None);
        assert_eq!(quote.outputs[1].yearly, None);
    }
}
