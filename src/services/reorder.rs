//! Reorder drafts.
//!
//! A draft is an unpersisted copy of an existing order. It can be cloned with
//! field level overrides and fed back into order creation, where only product
//! ids, quantities and the discount code survive; prices are always
//! re-resolved.

use crate::services::{
    catalog::OrderItemRequest,
    orders::{CreateOrderRequest, OrderDetail, PaymentMethod},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    pub product_id: i32,
    pub quantity: i32,
    /// Price captured by the source order, informational only.
    /// Overrides may omit it.
    #[serde(default)]
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub country: String,
    pub city: String,
    pub zip_code: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    #[schema(value_type = String)]
    pub fee: Decimal,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub discount_code: Option<String>,
    pub items: Vec<DraftItem>,
}

/// Partial draft. Absent fields keep the base value; `notes` and
/// `discountCode` also accept an explicit `null` to clear the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderDraftOverrides {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub delivery_address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    pub payment_method: Option<PaymentMethod>,
    #[schema(value_type = Option<String>)]
    pub fee: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub subtotal: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub total_price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub discount_code: Option<Option<String>>,
    /// Replaces the item list as a whole
    pub items: Option<Vec<DraftItem>>,
}

impl OrderDraftOverrides {
    /// Overrides used when a client asks for a plain reorder.
    pub fn clear_notes() -> Self {
        Self {
            notes: Some(None),
            ..Default::default()
        }
    }
}

/// Distinguishes a present `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<&OrderDetail> for OrderDraft {
    fn from(order: &OrderDetail) -> Self {
        Self {
            contact_name: order.contact_name.clone(),
            contact_email: order.contact_email.clone(),
            contact_phone: order.contact_phone.clone(),
            country: order.country.clone(),
            city: order.city.clone(),
            zip_code: order.zip_code.clone(),
            delivery_address: order.delivery_address.clone(),
            notes: order.notes.clone(),
            payment_method: order.payment_method,
            fee: order.fee,
            subtotal: order.subtotal,
            total_price: order.total_price,
            discount_code: order.discount.as_ref().map(|d| d.code.clone()),
            items: order
                .items
                .iter()
                .map(|item| DraftItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        }
    }
}

/// Field level merge. The result never shares item storage with `base`.
pub fn apply_overrides(base: &OrderDraft, overrides: OrderDraftOverrides) -> OrderDraft {
    OrderDraft {
        contact_name: overrides
            .contact_name
            .unwrap_or_else(|| base.contact_name.clone()),
        contact_email: overrides
            .contact_email
            .unwrap_or_else(|| base.contact_email.clone()),
        contact_phone: overrides
            .contact_phone
            .unwrap_or_else(|| base.contact_phone.clone()),
        country: overrides.country.unwrap_or_else(|| base.country.clone()),
        city: overrides.city.unwrap_or_else(|| base.city.clone()),
        zip_code: overrides.zip_code.unwrap_or_else(|| base.zip_code.clone()),
        delivery_address: overrides
            .delivery_address
            .unwrap_or_else(|| base.delivery_address.clone()),
        notes: overrides.notes.unwrap_or_else(|| base.notes.clone()),
        payment_method: overrides.payment_method.unwrap_or(base.payment_method),
        fee: overrides.fee.unwrap_or(base.fee),
        subtotal: overrides.subtotal.unwrap_or(base.subtotal),
        total_price: overrides.total_price.unwrap_or(base.total_price),
        discount_code: overrides
            .discount_code
            .unwrap_or_else(|| base.discount_code.clone()),
        items: overrides.items.unwrap_or_else(|| base.items.clone()),
    }
}

impl OrderDraft {
    /// Creation request for this draft. Draft prices and totals are dropped;
    /// empty notes or discount codes become absent.
    pub fn to_create_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            contact_name: self.contact_name.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
            country: self.country.clone(),
            city: self.city.clone(),
            zip_code: self.zip_code.clone(),
            delivery_address: self.delivery_address.clone(),
            notes: self.notes.clone().filter(|n| !n.is_empty()),
            payment_method: self.payment_method,
            items: self
                .items
                .iter()
                .map(|item| OrderItemRequest {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            discount_code: self.discount_code.clone().filter(|c| !c.is_empty()),
        }
    }
}
