use crate::{
    db::traits::{OrderManagement, OrderStoreError, ReviewManagement, RewardManagement, TransitionCommit},
    db_types::{Actor, OrderId, OrderStatusType, RewardPolicy},
};

/// This trait defines the highest level of behaviour for backends supporting the order engine.
///
/// On top of plain storage, a backend must be able to commit a status transition together with all of its side
/// effects in one atomic unit:
/// * the conditional status write,
/// * the audit trail entry,
/// * for transitions into `Completed`, the reward ledger credit and the opening of the review gate.
///
/// Either everything is written, or nothing is.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone + OrderManagement + RewardManagement + ReviewManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Commits `expected -> new_status` for the order. Returns `None`, with no changes made, if the order's status is no
    /// longer `expected` when the write is attempted.
    ///
    /// The caller is responsible for having validated the transition against the state machine.
    async fn commit_transition(
        &self,
        order_id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
        actor: &Actor,
        policy: &RewardPolicy,
    ) -> Result<Option<TransitionCommit>, OrderStoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderStoreError>;
}
