//! Order pricing pipeline.
//!
//! A calculator is an ordered list of [`PricingStage`]s folded left to right.
//! The base stage always comes first; the fee stage, when present, is applied
//! before the discount stage so the discount is taken from the raw subtotal
//! and never from the fee-inflated total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A product reference with its quantity and authoritative unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: i32,
    pub quantity: i32,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
}

impl LineItem {
    pub fn new(product_id: i32, quantity: i32, price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }
}

/// Everything a calculator reads. Lives only for one computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingInput {
    pub items: Vec<LineItem>,
    pub fee: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PricingOutput {
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub fee: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

/// Raw subtotal of a set of line items.
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingStage {
    /// `subtotal = Σ quantity × price`, everything else zero.
    Base,
    /// Adds `input.fee` to `fee` and `total`.
    Fee,
    /// Takes `input.discount_amount` off the subtotal, clamped at zero,
    /// keeping the fee computed by earlier stages.
    Discount,
}

impl PricingStage {
    pub fn apply(self, input: &PricingInput, inner: PricingOutput) -> PricingOutput {
        match self {
            PricingStage::Base => {
                let subtotal = subtotal(&input.items);
                PricingOutput {
                    subtotal,
                    fee: Decimal::ZERO,
                    discount: Decimal::ZERO,
                    total: subtotal,
                }
            }
            PricingStage::Fee => {
                let fee = input.fee.unwrap_or(Decimal::ZERO);
                PricingOutput {
                    fee,
                    total: inner.total + fee,
                    ..inner
                }
            }
            PricingStage::Discount => {
                let discount = input.discount_amount.unwrap_or(Decimal::ZERO);
                let discounted = (inner.subtotal - discount).max(Decimal::ZERO);
                PricingOutput {
                    discount,
                    total: discounted + inner.fee,
                    ..inner
                }
            }
        }
    }
}

/// A chain of stages, always rooted at [`PricingStage::Base`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCalculator {
    stages: Vec<PricingStage>,
}

impl PriceCalculator {
    pub fn base() -> Self {
        Self {
            stages: vec![PricingStage::Base],
        }
    }

    /// Wraps the current chain with another stage.
    pub fn with(mut self, stage: PricingStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[PricingStage] {
        &self.stages
    }

    pub fn compute(&self, input: &PricingInput) -> PricingOutput {
        self.stages
            .iter()
            .fold(PricingOutput::default(), |acc, stage| stage.apply(input, acc))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingFlags {
    pub has_fee: bool,
    pub has_discount: bool,
}

pub struct PricingFactory;

impl PricingFactory {
    /// Base, then Fee, then Discount. No other combinations exist.
    pub fn build(flags: PricingFlags) -> PriceCalculator {
        let mut calculator = PriceCalculator::base();
        if flags.has_fee {
            calculator = calculator.with(PricingStage::Fee);
        }
        if flags.has_discount {
            calculator = calculator.with(PricingStage::Discount);
        }
        calculator
    }
}

/// Decides the delivery fee for an order.
pub trait DeliveryFeePolicy: Send + Sync {
    fn fee_for(&self, items: &[LineItem]) -> Decimal;
}

/// Same fee for every order regardless of its contents.
#[derive(Debug, Clone, Copy)]
pub struct FlatDeliveryFee(pub Decimal);

impl DeliveryFeePolicy for FlatDeliveryFee {
    fn fee_for(&self, _items: &[LineItem]) -> Decimal {
        self.0
    }
}

/// Discount amount for a fractional percentage, rounded to cents.
pub fn discount_amount(subtotal: Decimal, percentage: Decimal) -> Decimal {
    (subtotal * percentage).round_dp(2)
}
