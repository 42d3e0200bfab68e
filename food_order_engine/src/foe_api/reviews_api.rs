use std::fmt::Debug;

use log::{debug, info};

use crate::{
    db::traits::{OrderManagement, ReviewManagement},
    db_types::{Actor, NewReview, OrderId, OrderStatusType, Review, Role},
    foe_api::errors::OrderFlowError,
};

/// The review gate. A customer may leave exactly one review per completed order.
pub struct ReviewApi<B> {
    db: B,
}

impl<B: Debug> Debug for ReviewApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReviewApi ({:?})", self.db)
    }
}

impl<B> ReviewApi<B>
where B: ReviewManagement + OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn submit_review(&self, actor: &Actor, review: NewReview) -> Result<Review, OrderFlowError> {
        if !review.rating_is_valid() {
            return Err(OrderFlowError::InvalidReview(format!(
                "Rating must be between {} and {}, got {}",
                NewReview::MIN_RATING,
                NewReview::MAX_RATING,
                review.rating
            )));
        }
        let order_id = &review.order_id;
        let order =
            self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| OrderFlowError::NotFound(order_id.clone()))?;
        if actor.role != Role::Customer || !actor.is_party_to(&order) {
            return Err(OrderFlowError::Unauthorized(format!("{actor} cannot review order {order_id}")));
        }
        if order.status != OrderStatusType::Completed {
            return Err(OrderFlowError::NotCompleted(order_id.clone()));
        }
        match self.db.submit_review(&review).await? {
            Some(saved) => {
                info!("⭐️ Order {order_id} reviewed by {actor}: {} stars", saved.rating);
                Ok(saved)
            },
            None => {
                // The order was completed when we looked, and completed is terminal, so the gate was already consumed.
                debug!("⭐️ Duplicate review for order {order_id} rejected");
                Err(OrderFlowError::AlreadyReviewed(order_id.clone()))
            },
        }
    }

    pub async fn review_for_order(&self, order_id: &OrderId) -> Result<Option<Review>, OrderFlowError> {
        Ok(self.db.fetch_review_for_order(order_id).await?)
    }

    /// The vendor's reviews and complaints view.
    pub async fn reviews_for_vendor(&self, actor: &Actor, complaints_only: bool) -> Result<Vec<Review>, OrderFlowError> {
        if actor.role != Role::Vendor {
            return Err(OrderFlowError::Unauthorized(format!("{actor} is not a vendor")));
        }
        Ok(self.db.fetch_reviews_for_vendor(&actor.user_id, complaints_only).await?)
    }
}
