use std::fmt;
use std::sync::Arc;

use shop_types::domain::order::{Order, PlaceOrderRequest};
use shop_types::domain::product::Reservation;
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::providers::{Clock, IdGenerator, SystemClock, UuidGenerator};
use shop_types::ports::user_repository::UserRepository;

use crate::application::deadline::Deadline;
use crate::errors::AppError;

/// Where a single placement call is. `Rejected` and `RolledBack` are the
/// failure terminals; only `RolledBack` follows side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStage {
    /// Request shape and user lookup.
    Validating,
    /// Taking stock line by line, including before the first line is taken.
    Reserving,
    Persisting,
    Committed,
    Rejected,
    RolledBack,
}

impl fmt::Display for PlacementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlacementStage::Validating => "validating",
            PlacementStage::Reserving => "reserving",
            PlacementStage::Persisting => "persisting",
            PlacementStage::Committed => "committed",
            PlacementStage::Rejected => "rejected",
            PlacementStage::RolledBack => "rolled back",
        };
        f.write_str(s)
    }
}

/// Places orders against the catalog and records them in the ledger.
pub struct OrderService<C, U, L> {
    catalog: Arc<C>,
    users: Arc<U>,
    ledger: Arc<L>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl<C, U, L> OrderService<C, U, L>
where
    C: ProductRepository,
    U: UserRepository,
    L: OrderRepository,
{
    pub fn new(catalog: Arc<C>, users: Arc<U>, ledger: Arc<L>) -> Self {
        Self {
            catalog,
            users,
            ledger,
            ids: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_providers(mut self, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        self.ids = ids;
        self.clock = clock;
        self
    }

    /// Reserves every line or none of them, then appends the order.
    ///
    /// Any failure after the first reservation (refused line, store error,
    /// ledger write, expired deadline) releases what was taken before the
    /// error is returned. Not idempotent: repeating a request places a second
    /// order.
    #[tracing::instrument(skip_all, fields(user_id = %request.user_id, lines = request.line_items.len()))]
    pub async fn place_order(
        &self,
        request: PlaceOrderRequest,
        deadline: &Deadline,
    ) -> Result<Order, AppError> {
        tracing::debug!(stage = %PlacementStage::Validating, "placement started");
        let draft = request.validate().map_err(|e| {
            tracing::debug!(stage = %PlacementStage::Rejected, error = %e, "order rejected");
            AppError::from(e)
        })?;

        match self.users.get_user(&draft.user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(stage = %PlacementStage::Rejected, "unknown user");
                return Err(AppError::NotFound(format!("user {}", draft.user_id)));
            }
            Err(e) => return Err(AppError::from_repo("get_user", e)),
        }

        let mut reservations: Vec<Reservation> = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            if let Some(reason) = deadline.interrupted() {
                self.roll_back(&reservations).await;
                return Err(AppError::Cancelled {
                    stage: PlacementStage::Reserving,
                    reason,
                });
            }
            match self
                .catalog
                .reserve_stock(&line.product_id, line.quantity)
                .await
            {
                Ok(reservation) => reservations.push(reservation),
                Err(e) => {
                    tracing::info!(
                        stage = %PlacementStage::Reserving,
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        error = %e,
                        "reservation refused"
                    );
                    self.roll_back(&reservations).await;
                    return Err(AppError::from_repo("reserve_stock", e));
                }
            }
        }

        if let Some(reason) = deadline.interrupted() {
            self.roll_back(&reservations).await;
            return Err(AppError::Cancelled {
                stage: PlacementStage::Persisting,
                reason,
            });
        }

        let timestamp = draft.timestamp.unwrap_or_else(|| self.clock.now());
        let order = match Order::from_reservations(
            self.ids.generate(),
            draft.user_id,
            &reservations,
            timestamp,
        ) {
            Ok(order) => order,
            Err(e) => {
                tracing::info!(stage = %PlacementStage::Persisting, error = %e, "order total refused");
                self.roll_back(&reservations).await;
                return Err(AppError::from(e));
            }
        };
        match self.ledger.append_order(order).await {
            Ok(order) => {
                tracing::info!(
                    stage = %PlacementStage::Committed,
                    order_id = %order.id,
                    total_cents = order.total_cents,
                    "order placed"
                );
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(stage = %PlacementStage::Persisting, error = %e, "ledger write failed");
                self.roll_back(&reservations).await;
                Err(AppError::from_repo("append_order", e))
            }
        }
    }

    // Releases newest first. A failed release is logged and the rest still run.
    async fn roll_back(&self, reservations: &[Reservation]) {
        for reservation in reservations.iter().rev() {
            match self.catalog.release_stock(reservation).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(
                    product_id = %reservation.product_id,
                    quantity = reservation.quantity,
                    "product vanished before its reservation was released"
                ),
                Err(e) => tracing::error!(
                    product_id = %reservation.product_id,
                    quantity = reservation.quantity,
                    error = %e,
                    "failed to release reservation"
                ),
            }
        }
        if !reservations.is_empty() {
            tracing::info!(
                stage = %PlacementStage::RolledBack,
                released = reservations.len(),
                "placement rolled back"
            );
        }
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, AppError> {
        match self
            .ledger
            .get_order(id)
            .await
            .map_err(|e| AppError::from_repo("get_order", e))?
        {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        self.ledger
            .list_orders()
            .await
            .map_err(|e| AppError::from_repo("list_orders", e))
    }

    /// Orders stay readable after their owner is deleted.
    pub async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        self.ledger
            .list_orders_for_user(user_id)
            .await
            .map_err(|e| AppError::from_repo("list_orders_for_user", e))
    }
}
