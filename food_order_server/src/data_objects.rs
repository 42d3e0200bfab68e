use fos_common::{Cents, DEFAULT_CURRENCY_CODE};
use food_order_engine::db_types::{LineItem, NewOrder, OrderId, OrderPartition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub state: Option<OrderPartition>,
}

impl OrdersQuery {
    pub fn partition(&self) -> OrderPartition {
        self.state.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WalletQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

impl WalletQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).min(Self::MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReviewsQuery {
    #[serde(default)]
    pub complaints_only: bool,
}

/// An order as submitted by a customer. The customer id is always taken from the caller's token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub order_id: OrderId,
    pub vendor_id: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub instructions: Option<String>,
    pub total_price: Cents,
    #[serde(default)]
    pub currency: Option<String>,
}

impl NewOrderRequest {
    pub fn into_new_order(self, customer_id: &str) -> NewOrder {
        NewOrder {
            order_id: self.order_id,
            customer_id: customer_id.to_string(),
            vendor_id: self.vendor_id,
            items: self.items,
            instructions: self.instructions,
            total_price: self.total_price,
            currency: self.currency.unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string()),
        }
    }
}
