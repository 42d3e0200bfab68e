use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use fos_common::{Cents, DEFAULT_CURRENCY_CODE};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The fulfilment states of an order.
///
/// `Completed` and `Cancelled` are terminal. See [`crate::state_machine`] for the permitted edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed, but the vendor has not picked it up yet.
    Pending,
    /// The vendor has accepted the order.
    Accepted,
    /// The kitchen is working on it.
    Preparing,
    /// The order has left the vendor.
    OutForDelivery,
    /// The order was delivered.
    Completed,
    /// The order was called off by the customer or the vendor.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// All statuses, in graph order.
    pub fn all() -> [Self; 6] {
        [Self::Pending, Self::Accepted, Self::Preparing, Self::OutForDelivery, Self::Completed, Self::Cancelled]
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "preparing" => Ok(Self::Preparing),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------        Role           ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The party that placed the order.
    Customer,
    /// The restaurant that fulfils the order.
    Vendor,
    /// A delivery partner assigned to the order.
    Courier,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Vendor => write!(f, "vendor"),
            Role::Courier => write!(f, "courier"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            "courier" => Ok(Self::Courier),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------        Actor          ---------------------------------------------------------
/// An authenticated identity, as vouched for by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new<S: Into<String>>(user_id: S, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    pub fn customer<S: Into<String>>(user_id: S) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn vendor<S: Into<String>>(user_id: S) -> Self {
        Self::new(user_id, Role::Vendor)
    }

    pub fn courier<S: Into<String>>(user_id: S) -> Self {
        Self::new(user_id, Role::Courier)
    }

    /// Whether this actor is a party to the given order in the capacity of their role.
    pub fn is_party_to(&self, order: &Order) -> bool {
        match self.role {
            Role::Customer => order.customer_id == self.user_id,
            Role::Vendor => order.vendor_id == self.user_id,
            Role::Courier => order.courier_id.as_deref() == Some(self.user_id.as_str()),
        }
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.role, self.user_id)
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderPartition      ---------------------------------------------------------
/// Client views always ask for live and finished orders separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPartition {
    /// Non-terminal orders
    #[default]
    Active,
    /// Completed and cancelled orders
    Historical,
}

impl OrderPartition {
    pub fn contains(&self, status: OrderStatusType) -> bool {
        match self {
            Self::Active => !status.is_terminal(),
            Self::Historical => status.is_terminal(),
        }
    }
}

impl Display for OrderPartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Historical => write!(f, "historical"),
        }
    }
}

//--------------------------------------   ReviewGateState     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewGateState {
    /// The order has not been completed. No review can be left.
    #[default]
    Locked,
    /// The order was completed and the customer may leave exactly one review.
    Open,
    /// A review exists for this order.
    Consumed,
}

//--------------------------------------        LineItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn new<S: Into<String>>(name: S, quantity: u32) -> Self {
        Self { name: name.into(), quantity }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub vendor_id: String,
    pub courier_id: Option<String>,
    #[sqlx(json)]
    pub items: Vec<LineItem>,
    pub instructions: Option<String>,
    pub total_price: Cents,
    pub currency: String,
    pub status: OrderStatusType,
    pub review_gate: ReviewGateState,
    pub review_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// The details of an order as supplied by the catalog/checkout flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: String,
    pub vendor_id: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub instructions: Option<String>,
    pub total_price: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

impl NewOrder {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        order_id: OrderId,
        customer_id: S1,
        vendor_id: S2,
        total_price: Cents,
    ) -> Self {
        Self {
            order_id,
            customer_id: customer_id.into(),
            vendor_id: vendor_id.into(),
            items: vec![],
            instructions: None,
            total_price,
            currency: default_currency(),
        }
    }

    pub fn with_item<S: Into<String>>(mut self, name: S, quantity: u32) -> Self {
        self.items.push(LineItem::new(name, quantity));
        self
    }

    pub fn with_instructions<S: Into<String>>(mut self, instructions: S) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

//--------------------------------------     StatusChange      ---------------------------------------------------------
/// One committed transition in an order's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: i64,
    pub order_id: OrderId,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub actor_id: String,
    pub actor_role: Role,
    pub changed_at: DateTime<Utc>,
}

//--------------------------------------    RewardCategory     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    /// The fixed credit for every completed delivery
    DeliveryCredit,
    /// The bonus for reaching a multiple of the milestone count
    MilestoneBonus,
}

impl Display for RewardCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeliveryCredit => write!(f, "delivery_credit"),
            Self::MilestoneBonus => write!(f, "milestone_bonus"),
        }
    }
}

//--------------------------------------   RewardTransaction   ---------------------------------------------------------
/// An immutable entry in a user's reward ledger.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct RewardTransaction {
    pub id: i64,
    pub user_id: String,
    pub amount: Cents,
    pub category: RewardCategory,
    pub description: String,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     RewardPolicy      ---------------------------------------------------------
/// How much the ledger credits for completed orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardPolicy {
    /// Credited for every completed order
    pub per_delivery_credit: Cents,
    /// A bonus is credited each time the lifetime completed-order count is a multiple of this number. Zero disables
    /// the bonus.
    pub milestone_every: u32,
    /// The size of the milestone bonus
    pub milestone_bonus: Cents,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self { per_delivery_credit: Cents::from(100), milestone_every: 10, milestone_bonus: Cents::from(500) }
    }
}

impl RewardPolicy {
    pub fn is_milestone(&self, completed_orders: i64) -> bool {
        self.milestone_every > 0 && completed_orders > 0 && completed_orders % i64::from(self.milestone_every) == 0
    }
}

//--------------------------------------        Review         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub vendor_id: String,
    pub rating: i64,
    pub text: String,
    pub is_complaint: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub order_id: OrderId,
    pub rating: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub is_complaint: bool,
}

impl NewReview {
    pub const MIN_RATING: i64 = 1;
    pub const MAX_RATING: i64 = 5;

    pub fn new<S: Into<String>>(order_id: OrderId, rating: i64, text: S) -> Self {
        Self { order_id, rating, text: text.into(), is_complaint: false }
    }

    pub fn as_complaint(mut self) -> Self {
        self.is_complaint = true;
        self
    }

    pub fn rating_is_valid(&self) -> bool {
        (Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating)
    }
}
