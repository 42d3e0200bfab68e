use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use chrono::Utc;
use food_order_engine::{
    db_types::{LineItem, Order, OrderId, OrderStatusType, ReviewGateState},
    notifications::SyncEvent,
    order_objects::WalletSummary,
};
use food_sync_client::{OrderSyncTransport, PushConnection, TransportError};
use fos_common::Cents;
use tokio::{sync::mpsc, time::Instant};

pub const CUSTOMER: &str = "alice";
pub const VENDOR: &str = "pizzeria";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushBehaviour {
    /// `open_push` never resolves.
    Hang,
    /// `open_push` fails straight away.
    Refuse,
    Open,
}

struct FakeState {
    behaviour: PushBehaviour,
    sender: Mutex<Option<mpsc::Sender<Result<SyncEvent, TransportError>>>>,
    active: Mutex<Vec<Order>>,
    orders: Mutex<HashMap<OrderId, Order>>,
    fail_polls: AtomicBool,
    push_attempts: AtomicUsize,
    polls: Mutex<Vec<Instant>>,
    order_fetches: AtomicUsize,
    wallet_fetches: AtomicUsize,
}

/// An in-memory server. Clones share state, so a test can keep one and hand the other to the manager.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<FakeState>,
}

impl FakeTransport {
    pub fn new(behaviour: PushBehaviour) -> Self {
        let state = FakeState {
            behaviour,
            sender: Mutex::new(None),
            active: Mutex::new(Vec::new()),
            orders: Mutex::new(HashMap::new()),
            fail_polls: AtomicBool::new(false),
            push_attempts: AtomicUsize::new(0),
            polls: Mutex::new(Vec::new()),
            order_fetches: AtomicUsize::new(0),
            wallet_fetches: AtomicUsize::new(0),
        };
        Self { state: Arc::new(state) }
    }

    pub fn push(&self, event: SyncEvent) {
        let sender = self.state.sender.lock().unwrap();
        sender.as_ref().expect("push channel is not open").try_send(Ok(event)).expect("push buffer full");
    }

    /// Closes the push channel from the server side.
    pub fn drop_push(&self) {
        self.state.sender.lock().unwrap().take();
    }

    /// What the active-orders endpoint returns from now on.
    pub fn set_active(&self, orders: Vec<Order>) {
        for order in &orders {
            self.set_order(order.clone());
        }
        *self.state.active.lock().unwrap() = orders;
    }

    /// What the single-order endpoint returns for this order id from now on.
    pub fn set_order(&self, order: Order) {
        self.state.orders.lock().unwrap().insert(order.order_id.clone(), order);
    }

    pub fn fail_polls(&self, fail: bool) {
        self.state.fail_polls.store(fail, Ordering::SeqCst);
    }

    pub fn push_attempts(&self) -> usize {
        self.state.push_attempts.load(Ordering::SeqCst)
    }

    pub fn poll_times(&self) -> Vec<Instant> {
        self.state.polls.lock().unwrap().clone()
    }

    pub fn order_fetches(&self) -> usize {
        self.state.order_fetches.load(Ordering::SeqCst)
    }

    pub fn wallet_fetches(&self) -> usize {
        self.state.wallet_fetches.load(Ordering::SeqCst)
    }
}

impl OrderSyncTransport for FakeTransport {
    async fn open_push(&self) -> Result<PushConnection, TransportError> {
        self.state.push_attempts.fetch_add(1, Ordering::SeqCst);
        match self.state.behaviour {
            PushBehaviour::Hang => futures::future::pending().await,
            PushBehaviour::Refuse => Err(TransportError::ServerError { status: 503, message: "Busy".into() }),
            PushBehaviour::Open => {
                let (tx, rx) = mpsc::channel(32);
                *self.state.sender.lock().unwrap() = Some(tx);
                Ok(rx)
            },
        }
    }

    async fn fetch_active_orders(&self) -> Result<Vec<Order>, TransportError> {
        self.state.polls.lock().unwrap().push(Instant::now());
        if self.state.fail_polls.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionError("connection reset".into()));
        }
        Ok(self.state.active.lock().unwrap().clone())
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, TransportError> {
        self.state.order_fetches.fetch_add(1, Ordering::SeqCst);
        self.state
            .orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| TransportError::ServerError { status: 404, message: format!("{order_id} not found") })
    }

    async fn fetch_wallet(&self, limit: u32) -> Result<WalletSummary, TransportError> {
        assert!(limit > 0);
        let n = self.state.wallet_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(WalletSummary::new(CUSTOMER.into(), Cents::from(100 * n as i64), vec![]))
    }
}

pub fn order(id: &str, status: OrderStatusType) -> Order {
    let now = Utc::now();
    Order {
        id: 1,
        order_id: OrderId::from(id),
        customer_id: CUSTOMER.into(),
        vendor_id: VENDOR.into(),
        courier_id: None,
        items: vec![LineItem::new("Margherita", 2)],
        instructions: None,
        total_price: Cents::from(2400),
        currency: "USD".into(),
        status,
        review_gate: if status == OrderStatusType::Completed { ReviewGateState::Open } else { ReviewGateState::Locked },
        review_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn status_changed(id: &str, status: OrderStatusType) -> SyncEvent {
    SyncEvent::StatusChanged { order_id: OrderId::from(id), status, updated_at: Utc::now() }
}
