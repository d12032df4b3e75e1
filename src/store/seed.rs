//! Bundled mock catalog used when `catalog.seed` is enabled: three
//! category templates, six providers and the bootstrap super admin.

use chrono::Utc;
use cyder_tools::log::warn;
use serde_json::json;

use crate::service::app_state::AppState;

use super::admin::{AdminPermission, AdminRole, AdminStatus, NewAdmin};
use super::category::{
    FieldKind, NewCategory, OutputDefinition, PriceDetailField, SliderDefinition,
};
use super::provider::{
    MetricKind, NewProvider, Output, PriceDetail, PricingModel, Slider, UnitPrice, UsageMetric,
};

/// Default actor for mutations that arrive without an explicit admin id.
pub const BOOTSTRAP_ADMIN_ID: i64 = 1;

fn slider_defs(names: &[&str]) -> Vec<SliderDefinition> {
    names
        .iter()
        .map(|name| SliderDefinition {
            name: name.to_string(),
        })
        .collect()
}

fn output_defs(names: &[&str]) -> Vec<OutputDefinition> {
    names
        .iter()
        .map(|name| OutputDefinition {
            name: name.to_string(),
        })
        .collect()
}

fn number_field(name: &str, description: &str) -> PriceDetailField {
    PriceDetailField {
        name: name.to_string(),
        kind: FieldKind::Number,
        description: description.to_string(),
    }
}

fn token_metric() -> UsageMetric {
    UsageMetric {
        kind: MetricKind::Tokens,
        label: "Monthly Tokens".to_string(),
        default_value: 1_000_000.0,
        output_default_value: Some(800_000.0),
        step: 100_000.0,
        min: 100_000.0,
        max: 10_000_000.0,
    }
}

fn token_sliders() -> Vec<Slider> {
    vec![
        Slider {
            name: "Input Tokens".to_string(),
            min_value: 0.0,
            max_value: 10_000_000.0,
            step: 100_000.0,
        },
        Slider {
            name: "Output Tokens".to_string(),
            min_value: 0.0,
            max_value: 10_000_000.0,
            step: 100_000.0,
        },
    ]
}

fn token_outputs(input_rate: f64, output_rate: f64) -> Vec<Output> {
    let total = format!(
        "Input Tokens * {} + Output Tokens * {}",
        input_rate, output_rate
    );
    vec![
        Output {
            name: "Input Cost".to_string(),
            cost_per_unit: input_rate,
            monthly_calculation: format!("Input Tokens * {}", input_rate),
            yearly_calculation: format!("Input Tokens * {} * 12", input_rate),
        },
        Output {
            name: "Output Cost".to_string(),
            cost_per_unit: output_rate,
            monthly_calculation: format!("Output Tokens * {}", output_rate),
            yearly_calculation: format!("Output Tokens * {} * 12", output_rate),
        },
        Output {
            name: "Total Cost".to_string(),
            cost_per_unit: 0.0,
            monthly_calculation: total.clone(),
            yearly_calculation: format!("({}) * 12", total),
        },
    ]
}

fn unit_outputs(slider_name: &str, rate: f64) -> Vec<Output> {
    vec![Output {
        name: "Total Cost".to_string(),
        cost_per_unit: rate,
        monthly_calculation: format!("{} * {}", slider_name, rate),
        yearly_calculation: format!("{} * {} * 12", slider_name, rate),
    }]
}

fn detail(name: &str, value: f64) -> PriceDetail {
    PriceDetail {
        name: name.to_string(),
        value: json!(value),
    }
}

pub fn seed(state: &AppState) {
    let now = Utc::now().timestamp_millis();

    let categories = vec![
        NewCategory {
            id: 1,
            category_key: "text-generation".to_string(),
            name: "Text Generation".to_string(),
            slider_definitions: slider_defs(&["Input Tokens", "Output Tokens"]),
            output_definitions: output_defs(&["Input Cost", "Output Cost", "Total Cost"]),
            price_detail_fields: vec![
                number_field("Input Token Price", "Cost per input token"),
                number_field("Output Token Price", "Cost per output token"),
                number_field("Context Length", "Maximum context length in tokens"),
            ],
            created_at: now,
            updated_at: now,
        },
        NewCategory {
            id: 2,
            category_key: "image-generation".to_string(),
            name: "Image Generation".to_string(),
            slider_definitions: slider_defs(&["Images per Month"]),
            output_definitions: output_defs(&["Total Cost"]),
            price_detail_fields: vec![number_field("Price per Image", "Cost per generated image")],
            created_at: now,
            updated_at: now,
        },
        NewCategory {
            id: 3,
            category_key: "speech-to-text".to_string(),
            name: "Speech to Text".to_string(),
            slider_definitions: slider_defs(&["Audio Minutes"]),
            output_definitions: output_defs(&["Total Cost"]),
            price_detail_fields: vec![number_field(
                "Price per Minute",
                "Cost per transcribed audio minute",
            )],
            created_at: now,
            updated_at: now,
        },
    ];

    for category in categories {
        if let Err(e) = state.categories.create(category) {
            warn!("failed to seed category: {}", e);
        }
    }

    let providers = vec![
        NewProvider {
            id: 11,
            provider_key: "openai-gpt4".to_string(),
            name: "GPT-4".to_string(),
            vendor: "OpenAI".to_string(),
            category_key: "text-generation".to_string(),
            description: "Advanced language model for text generation and analysis".to_string(),
            documentation_url: "https://openai.com/gpt-4".to_string(),
            logo_url: "https://images.unsplash.com/photo-1677442136019-21780ecad995?w=64&h=64&fit=crop"
                .to_string(),
            pricing_model: PricingModel::PayPerUse,
            featured: false,
            usage_metric: token_metric(),
            price_per_unit: UnitPrice {
                input: Some(0.03),
                output: Some(0.06),
                operation: None,
            },
            sliders: token_sliders(),
            outputs: token_outputs(0.03, 0.06),
            price_details: vec![
                detail("Input Token Price", 0.03),
                detail("Output Token Price", 0.06),
                detail("Context Length", 8192.0),
            ],
            custom_fields: Vec::new(),
            created_at: now,
            updated_at: now,
        },
        NewProvider {
            id: 12,
            provider_key: "anthropic-claude".to_string(),
            name: "Claude 2".to_string(),
            vendor: "Anthropic".to_string(),
            category_key: "text-generation".to_string(),
            description: "Anthropic's advanced AI model for text generation".to_string(),
            documentation_url: "https://anthropic.com/claude".to_string(),
            logo_url: "https://images.unsplash.com/photo-1620712943543-bcc4688e7485?w=64&h=64&fit=crop"
                .to_string(),
            pricing_model: PricingModel::PayPerUse,
            featured: false,
            usage_metric: token_metric(),
            price_per_unit: UnitPrice {
                input: Some(0.02),
                output: Some(0.04),
                operation: None,
            },
            sliders: token_sliders(),
            outputs: token_outputs(0.02, 0.04),
            price_details: vec![
                detail("Input Token Price", 0.02),
                detail("Output Token Price", 0.04),
                detail("Context Length", 100_000.0),
            ],
            custom_fields: Vec::new(),
            created_at: now,
            updated_at: now,
        },
        NewProvider {
            id: 13,
            provider_key: "openai-dall-e".to_string(),
            name: "DALL-E 3".to_string(),
            vendor: "OpenAI".to_string(),
            category_key: "image-generation".to_string(),
            description: "Create realistic images and art from text descriptions".to_string(),
            documentation_url: "https://openai.com/dall-e-3".to_string(),
            logo_url: "https://images.unsplash.com/photo-1699133869757-dd1c241d5e7d?w=64&h=64&fit=crop"
                .to_string(),
            pricing_model: PricingModel::PayPerUse,
            featured: false,
            usage_metric: UsageMetric {
                kind: MetricKind::Images,
                label: "Images per Month".to_string(),
                default_value: 100.0,
                output_default_value: None,
                step: 10.0,
                min: 10.0,
                max: 10_000.0,
            },
            price_per_unit: UnitPrice {
                input: None,
                output: None,
                operation: Some(0.02),
            },
            sliders: vec![Slider {
                name: "Images per Month".to_string(),
                min_value: 10.0,
                max_value: 10_000.0,
                step: 10.0,
            }],
            outputs: unit_outputs("Images per Month", 0.02),
            price_details: vec![detail("Price per Image", 0.02)],
            custom_fields: Vec::new(),
            created_at: now,
            updated_at: now,
        },
        NewProvider {
            id: 14,
            provider_key: "midjourney".to_string(),
            name: "Midjourney".to_string(),
            vendor: "Midjourney Inc.".to_string(),
            category_key: "image-generation".to_string(),
            description: "AI art generation with unique artistic style".to_string(),
            documentation_url: "https://docs.midjourney.com".to_string(),
            logo_url: "https://images.unsplash.com/photo-1681412332760-3e97e8724d48?w=64&h=64&fit=crop"
                .to_string(),
            pricing_model: PricingModel::Subscription,
            featured: false,
            usage_metric: UsageMetric {
                kind: MetricKind::Images,
                label: "Images per Month".to_string(),
                default_value: 200.0,
                output_default_value: None,
                step: 50.0,
                min: 50.0,
                max: 20_000.0,
            },
            price_per_unit: UnitPrice {
                input: None,
                output: None,
                operation: Some(0.15),
            },
            sliders: vec![Slider {
                name: "Images per Month".to_string(),
                min_value: 50.0,
                max_value: 20_000.0,
                step: 50.0,
            }],
            outputs: unit_outputs("Images per Month", 0.15),
            price_details: vec![detail("Price per Image", 0.15)],
            custom_fields: Vec::new(),
            created_at: now,
            updated_at: now,
        },
        NewProvider {
            id: 15,
            provider_key: "whisper".to_string(),
            name: "Whisper".to_string(),
            vendor: "OpenAI".to_string(),
            category_key: "speech-to-text".to_string(),
            description: "Advanced speech recognition model".to_string(),
            documentation_url: "https://openai.com/whisper".to_string(),
            logo_url: "https://images.unsplash.com/photo-1589254065878-42c9da997008?w=64&h=64&fit=crop"
                .to_string(),
            pricing_model: PricingModel::PayPerUse,
            featured: false,
            usage_metric: UsageMetric {
                kind: MetricKind::Minutes,
                label: "Audio Minutes".to_string(),
                default_value: 100.0,
                output_default_value: None,
                step: 10.0,
                min: 10.0,
                max: 10_000.0,
            },
            price_per_unit: UnitPrice {
                input: None,
                output: None,
                operation: Some(0.006),
            },
            sliders: vec![Slider {
                name: "Audio Minutes".to_string(),
                min_value: 10.0,
                max_value: 10_000.0,
                step: 10.0,
            }],
            outputs: unit_outputs("Audio Minutes", 0.006),
            price_details: vec![detail("Price per Minute", 0.006)],
            custom_fields: Vec::new(),
            created_at: now,
            updated_at: now,
        },
        NewProvider {
            id: 16,
            provider_key: "assembly-ai".to_string(),
            name: "AssemblyAI".to_string(),
            vendor: "AssemblyAI Inc.".to_string(),
            category_key: "speech-to-text".to_string(),
            description: "Real-time speech recognition API".to_string(),
            documentation_url: "https://www.assemblyai.com/docs".to_string(),
            logo_url: "https://images.unsplash.com/photo-1590602847861-f357a9332bbc?w=64&h=64&fit=crop"
                .to_string(),
            pricing_model: PricingModel::PayPerUse,
            featured: false,
            usage_metric: UsageMetric {
                kind: MetricKind::Minutes,
                label: "Audio Minutes".to_string(),
                default_value: 100.0,
                output_default_value: None,
                step: 10.0,
                min: 10.0,
                max: 10_000.0,
            },
            price_per_unit: UnitPrice {
                input: None,
                output: None,
                operation: Some(0.005),
            },
            sliders: vec![Slider {
                name: "Audio Minutes".to_string(),
                min_value: 10.0,
                max_value: 10_000.0,
                step: 10.0,
            }],
            outputs: unit_outputs("Audio Minutes", 0.005),
            price_details: vec![detail("Price per Minute", 0.005)],
            custom_fields: Vec::new(),
            created_at: now,
            updated_at: now,
        },
    ];

    for provider in providers {
        if let Err(e) = state.providers.create(provider) {
            warn!("failed to seed provider: {}", e);
        }
    }

    let bootstrap_admin = NewAdmin {
        id: BOOTSTRAP_ADMIN_ID,
        name: "John Doe".to_string(),
        email: "john@example.com".to_string(),
        role: AdminRole::SuperAdmin,
        status: AdminStatus::Active,
        permissions: vec![
            AdminPermission::ManageAdmins,
            AdminPermission::ManageCategories,
            AdminPermission::ManageProviders,
            AdminPermission::ViewDashboard,
            AdminPermission::EditSettings,
        ],
        created_at: now,
        updated_at: now,
    };
    if let Err(e) = state.admins.create(bootstrap_admin) {
        warn!("failed to seed bootstrap admin: {}", e);
    }
}
