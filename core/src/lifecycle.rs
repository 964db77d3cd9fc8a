//! Order lifecycle state machine.
//!
//! Commands are validated against the current order and turned into events;
//! events are applied to the order document. The only reachable path is
//! Created → Paid → Delivered.

use crate::environment::Clock;
use crate::error::{OrderError, Result};
use crate::types::{Order, OrderId, OrderStatus, PaymentEvidence, PaymentRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Requests to move an order forward
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderCommand {
    /// Record a confirmed payment
    MarkPaid {
        /// Gateway evidence
        evidence: PaymentEvidence,
    },
    /// Record delivery
    MarkDelivered,
}

/// Facts produced by a successful transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    /// Payment was recorded
    OrderPaid {
        /// Order identifier
        order_id: OrderId,
        /// Payment written to the order
        payment: PaymentRecord,
    },
    /// Delivery was recorded
    OrderDelivered {
        /// Order identifier
        order_id: OrderId,
        /// When the order was delivered
        delivered_at: DateTime<Utc>,
    },
}

impl OrderEvent {
    /// Status the order is in after this event
    #[must_use]
    pub const fn resulting_status(&self) -> OrderStatus {
        match self {
            Self::OrderPaid { .. } => OrderStatus::Paid,
            Self::OrderDelivered { .. } => OrderStatus::Delivered,
        }
    }
}

/// Order lifecycle rules
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderLifecycle;

impl OrderLifecycle {
    /// Validates a command against the order and produces the resulting event.
    ///
    /// Does not modify the order.
    ///
    /// # Errors
    ///
    /// - [`OrderError::InvalidPaymentEvidence`] if payer or transaction id is blank
    /// - [`OrderError::AlreadyPaid`] when paying a paid or delivered order
    /// - [`OrderError::NotYetPaid`] when delivering an unpaid order
    /// - [`OrderError::AlreadyDelivered`] when delivering twice
    pub fn decide(order: &Order, command: OrderCommand, clock: &dyn Clock) -> Result<OrderEvent> {
        match command {
            OrderCommand::MarkPaid { evidence } => {
                Self::validate_mark_paid(order)?;
                Self::validate_evidence(&evidence)?;
                Ok(OrderEvent::OrderPaid {
                    order_id: order.id.clone(),
                    payment: PaymentRecord {
                        paid_at: clock.now(),
                        result: evidence,
                    },
                })
            },
            OrderCommand::MarkDelivered => {
                Self::validate_mark_delivered(order)?;
                Ok(OrderEvent::OrderDelivered {
                    order_id: order.id.clone(),
                    delivered_at: clock.now(),
                })
            },
        }
    }

    /// Applies an event to the order.
    ///
    /// Each event writes its flag and timestamp as a single record.
    pub fn apply_event(order: &mut Order, event: &OrderEvent) {
        match event {
            OrderEvent::OrderPaid { payment, .. } => {
                order.payment = Some(payment.clone());
            },
            OrderEvent::OrderDelivered { delivered_at, .. } => {
                order.delivered_at = Some(*delivered_at);
            },
        }
    }

    /// Decides and applies in one step, returning the updated copy and the event.
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::decide`].
    pub fn handle(
        order: &Order,
        command: OrderCommand,
        clock: &dyn Clock,
    ) -> Result<(Order, OrderEvent)> {
        let event = Self::decide(order, command, clock)?;
        let mut updated = order.clone();
        Self::apply_event(&mut updated, &event);
        Ok((updated, event))
    }

    fn validate_mark_paid(order: &Order) -> Result<()> {
        match order.status() {
            OrderStatus::Created => Ok(()),
            status @ (OrderStatus::Paid | OrderStatus::Delivered) => Err(OrderError::AlreadyPaid {
                order_id: order.id.clone(),
                status,
            }),
        }
    }

    fn validate_mark_delivered(order: &Order) -> Result<()> {
        match order.status() {
            OrderStatus::Paid => Ok(()),
            OrderStatus::Created => Err(OrderError::NotYetPaid {
                order_id: order.id.clone(),
            }),
            OrderStatus::Delivered => Err(OrderError::AlreadyDelivered {
                order_id: order.id.clone(),
            }),
        }
    }

    fn validate_evidence(evidence: &PaymentEvidence) -> Result<()> {
        if evidence.payer_id.trim().is_empty() {
            return Err(OrderError::InvalidPaymentEvidence {
                reason: "payer id is required".to_string(),
            });
        }
        if evidence.transaction_id.trim().is_empty() {
            return Err(OrderError::InvalidPaymentEvidence {
                reason: "transaction id is required".to_string(),
            });
        }
        Ok(())
    }
}
