//! Price rounding and bucketing for targeting values and returned prices.
//!
//! A transformer converts the endpoint's price into cents, clamps it into the
//! configured buckets, steps it down (or up) to the bucket granularity and
//! formats it for the ad server's line items.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::auction::services::PriceTransformer;

/// How a price is aligned to its bucket step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingType {
    #[default]
    Floor,
    Round,
    Ceil,
    None,
}

/// Price granularity up to an upper bound, both in cents.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceBucket {
    pub max: f64,
    pub step: f64,
}

/// Configuration for one bid transformer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct BidTransformerConfig {
    /// Cents per unit of the incoming price. Falls back to the profile's
    /// `bid_unit_in_cents` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub input_cents_multiplier: Option<u32>,

    #[serde(default = "default_output_cents_divisor")]
    #[validate(range(min = 1))]
    pub output_cents_divisor: u32,

    #[serde(default = "default_output_precision")]
    #[validate(range(max = 6))]
    pub output_precision: u8,

    #[serde(default)]
    pub rounding_type: RoundingType,

    /// Minimum price in cents; anything below transforms to zero.
    #[serde(default)]
    pub floor: f64,

    #[serde(default = "default_buckets")]
    #[validate(custom(function = "validate_buckets"))]
    pub buckets: Vec<PriceBucket>,
}

fn default_output_cents_divisor() -> u32 {
    100
}

fn default_output_precision() -> u8 {
    2
}

fn default_buckets() -> Vec<PriceBucket> {
    vec![PriceBucket {
        max: 5000.0,
        step: 1.0,
    }]
}

impl Default for BidTransformerConfig {
    fn default() -> Self {
        Self {
            input_cents_multiplier: None,
            output_cents_divisor: default_output_cents_divisor(),
            output_precision: default_output_precision(),
            rounding_type: RoundingType::default(),
            floor: 0.0,
            buckets: default_buckets(),
        }
    }
}

fn validate_buckets(buckets: &[PriceBucket]) -> Result<(), ValidationError> {
    let mut previous_max = 0.0;
    for bucket in buckets {
        if !(bucket.step.is_finite() && bucket.step > 0.0) {
            return Err(ValidationError::new("bucket_step")
                .with_message(Cow::from("bucket step must be a positive number of cents")));
        }
        if !bucket.max.is_finite() || bucket.max <= previous_max {
            return Err(ValidationError::new("bucket_order")
                .with_message(Cow::from("bucket max values must be strictly increasing")));
        }
        previous_max = bucket.max;
    }
    Ok(())
}

/// Removes float noise such as `504.99999999999994` before rounding.
fn snap(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Default [`PriceTransformer`] driven by a [`BidTransformerConfig`].
#[derive(Debug, Clone)]
pub struct BidTransformer {
    config: BidTransformerConfig,
    input_cents_multiplier: f64,
}

impl BidTransformer {
    #[must_use]
    pub fn new(config: BidTransformerConfig, bid_unit_in_cents: u32) -> Self {
        let input_cents_multiplier = f64::from(
            config
                .input_cents_multiplier
                .unwrap_or(bid_unit_in_cents),
        );
        Self {
            config,
            input_cents_multiplier,
        }
    }

    /// Transform `price` into output units without formatting.
    #[must_use]
    pub fn transform(&self, price: f64) -> f64 {
        if !price.is_finite() {
            return 0.0;
        }

        let mut cents = snap(price * self.input_cents_multiplier);
        if cents <= 0.0 || cents < self.config.floor {
            return 0.0;
        }

        let bucket = self
            .config
            .buckets
            .iter()
            .find(|bucket| cents <= bucket.max)
            .or_else(|| {
                let last = self.config.buckets.last();
                if let Some(last) = last {
                    cents = last.max;
                }
                last
            });

        if let Some(bucket) = bucket {
            let steps = snap(cents / bucket.step);
            let steps = match self.config.rounding_type {
                RoundingType::Floor => steps.floor(),
                RoundingType::Round => steps.round(),
                RoundingType::Ceil => steps.ceil(),
                RoundingType::None => steps,
            };
            cents = steps * bucket.step;
        }

        snap(cents / f64::from(self.config.output_cents_divisor))
    }
}

impl PriceTransformer for BidTransformer {
    fn apply(&self, price: f64) -> String {
        let precision = usize::from(self.config.output_precision);
        format!("{:.*}", precision, self.transform(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer(buckets: Vec<PriceBucket>, rounding_type: RoundingType) -> BidTransformer {
        BidTransformer::new(
            BidTransformerConfig {
                rounding_type,
                buckets,
                ..BidTransformerConfig::default()
            },
            100,
        )
    }

    #[test]
    fn test_default_transformer_keeps_cent_precision() {
        let t = BidTransformer::new(BidTransformerConfig::default(), 100);
        assert_eq!(t.apply(4.0), "4.00");
        assert_eq!(t.apply(5.0), "5.00");
        assert_eq!(t.apply(1.234), "1.23");
    }

    #[test]
    fn test_float_noise_does_not_lose_a_cent() {
        // 1.0 * 10.1 / 2 is 5.049999999999999 in f64
        let t = BidTransformer::new(BidTransformerConfig::default(), 100);
        assert_eq!(t.apply(1.0 * 10.1 / 2.0), "5.05");
    }

    #[test]
    fn test_price_above_last_bucket_is_clamped() {
        let t = BidTransformer::new(BidTransformerConfig::default(), 100);
        assert_eq!(t.apply(75.0), "50.00");
    }

    #[test]
    fn test_bucket_steps() {
        let t = transformer(
            vec![
                PriceBucket {
                    max: 500.0,
                    step: 5.0,
                },
                PriceBucket {
                    max: 2000.0,
                    step: 50.0,
                },
            ],
            RoundingType::Floor,
        );
        assert_eq!(t.apply(1.23), "1.20");
        assert_eq!(t.apply(7.99), "7.50");
        assert_eq!(t.apply(25.0), "20.00");
    }

    #[test]
    fn test_rounding_types() {
        let buckets = vec![PriceBucket {
            max: 5000.0,
            step: 10.0,
        }];
        assert_eq!(
            transformer(buckets.clone(), RoundingType::Floor).apply(1.26),
            "1.20"
        );
        assert_eq!(
            transformer(buckets.clone(), RoundingType::Round).apply(1.26),
            "1.30"
        );
        assert_eq!(
            transformer(buckets.clone(), RoundingType::Ceil).apply(1.21),
            "1.30"
        );
        assert_eq!(transformer(buckets, RoundingType::None).apply(1.26), "1.26");
    }

    #[test]
    fn test_floor_and_non_positive_prices() {
        let t = BidTransformer::new(
            BidTransformerConfig {
                floor: 50.0,
                ..BidTransformerConfig::default()
            },
            100,
        );
        assert_eq!(t.apply(0.49), "0.00");
        assert_eq!(t.apply(0.5), "0.50");
        assert_eq!(t.apply(-3.0), "0.00");
        assert_eq!(t.apply(f64::NAN), "0.00");
    }

    #[test]
    fn test_input_multiplier_and_output_format() {
        // Endpoint quoting in cents, output in whole dollars with one decimal.
        let t = BidTransformer::new(
            BidTransformerConfig {
                input_cents_multiplier: Some(1),
                output_precision: 1,
                ..BidTransformerConfig::default()
            },
            100,
        );
        assert_eq!(t.apply(250.0), "2.5");
    }

    #[test]
    fn test_empty_buckets_skip_stepping() {
        let t = transformer(Vec::new(), RoundingType::Floor);
        assert_eq!(t.apply(123.456), "123.46");
    }

    #[test]
    fn test_bucket_validation() {
        let mut config = BidTransformerConfig::default();
        assert!(config.validate().is_ok());

        config.buckets = vec![
            PriceBucket {
                max: 2000.0,
                step: 5.0,
            },
            PriceBucket {
                max: 1000.0,
                step: 10.0,
            },
        ];
        assert!(config.validate().is_err());

        config.buckets = vec![PriceBucket {
            max: 2000.0,
            step: 0.0,
        }];
        assert!(config.validate().is_err());
    }
}
