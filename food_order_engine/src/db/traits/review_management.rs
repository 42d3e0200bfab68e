use crate::{
    db::traits::OrderStoreError,
    db_types::{NewReview, OrderId, Review},
};

#[allow(async_fn_in_trait)]
pub trait ReviewManagement {
    /// Consumes the order's review gate and stores the review in a single atomic step.
    ///
    /// Returns `None` without writing anything if the gate is not open, i.e. the order does not exist, is not
    /// completed, or already has a review. It is up to the caller to work out which.
    async fn submit_review(&self, review: &NewReview) -> Result<Option<Review>, OrderStoreError>;

    async fn fetch_review_for_order(&self, order_id: &OrderId) -> Result<Option<Review>, OrderStoreError>;

    /// The reviews left for a vendor, newest first. With `complaints_only`, only reviews flagged as complaints.
    async fn fetch_reviews_for_vendor(
        &self,
        vendor_id: &str,
        complaints_only: bool,
    ) -> Result<Vec<Review>, OrderStoreError>;
}
