// Order status transition table
//
// Pending -> InProgress -> Completed -> Invoiced. Operators may jump between
// any of the first three through the edit form. Invoiced is entered only when
// the order's invoice task is settled and is final once reached.

use crate::entities::{EntityId, OrderStatus};
use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// Direct status edit from the order form
    Edit(OrderStatus),
    /// The completion-confirmation protocol
    Close,
    /// The order's invoice task reached Done
    InvoiceSettled,
}

impl OrderStatus {
    /// Next status for `event`, or the reason the transition is refused.
    ///
    /// `order` is only used to label the error.
    pub fn apply(self, event: OrderEvent, order: &EntityId) -> Result<OrderStatus, ValidationError> {
        use OrderStatus::*;

        match (self, event) {
            (Invoiced, OrderEvent::InvoiceSettled) => Ok(Invoiced),
            (Completed, OrderEvent::InvoiceSettled) => Ok(Invoiced),
            (status, OrderEvent::InvoiceSettled) => Err(ValidationError::NotCompleted {
                order: order.clone(),
                status,
            }),

            (Invoiced, OrderEvent::Edit(_)) => Err(ValidationError::OrderInvoiced {
                order: order.clone(),
            }),
            (_, OrderEvent::Edit(Invoiced)) => Err(ValidationError::InvoicedRequiresSettlement {
                order: order.clone(),
            }),
            (_, OrderEvent::Edit(target)) => Ok(target),

            // Closing a Completed order again is how a failed invoice-task step is retried
            (Pending | InProgress | Completed, OrderEvent::Close) => Ok(Completed),
            (Invoiced, OrderEvent::Close) => Err(ValidationError::OrderAlreadyClosed {
                order: order.clone(),
                status: Invoiced,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn id() -> EntityId {
        EntityId::new("o-1")
    }

    #[test]
    fn test_edit_may_skip_in_progress() {
        assert_eq!(Pending.apply(OrderEvent::Edit(Completed), &id()), Ok(Completed));
        assert_eq!(Completed.apply(OrderEvent::Edit(Pending), &id()), Ok(Pending));
        assert_eq!(InProgress.apply(OrderEvent::Edit(InProgress), &id()), Ok(InProgress));
    }

    #[test]
    fn test_no_edit_reaches_invoiced() {
        for status in [Pending, InProgress, Completed] {
            assert!(matches!(
                status.apply(OrderEvent::Edit(Invoiced), &id()),
                Err(ValidationError::InvoicedRequiresSettlement { .. })
            ));
        }
    }

    #[test]
    fn test_invoiced_is_final_for_edits() {
        for target in OrderStatus::ALL {
            assert!(matches!(
                Invoiced.apply(OrderEvent::Edit(target), &id()),
                Err(ValidationError::OrderInvoiced { .. })
            ));
        }
    }

    #[test]
    fn test_close_refused_only_once_invoiced() {
        assert_eq!(Pending.apply(OrderEvent::Close, &id()), Ok(Completed));
        assert_eq!(InProgress.apply(OrderEvent::Close, &id()), Ok(Completed));
        assert_eq!(Completed.apply(OrderEvent::Close, &id()), Ok(Completed));
        assert!(matches!(
            Invoiced.apply(OrderEvent::Close, &id()),
            Err(ValidationError::OrderAlreadyClosed { status: Invoiced, .. })
        ));
    }

    #[test]
    fn test_settlement_requires_completed() {
        assert_eq!(Completed.apply(OrderEvent::InvoiceSettled, &id()), Ok(Invoiced));
        assert_eq!(Invoiced.apply(OrderEvent::InvoiceSettled, &id()), Ok(Invoiced));
        assert!(matches!(
            Pending.apply(OrderEvent::InvoiceSettled, &id()),
            Err(ValidationError::NotCompleted { status: Pending, .. })
        ));
    }

    #[test]
    fn test_invoiced_only_reachable_by_settlement() {
        let events = OrderStatus::ALL
            .into_iter()
            .map(OrderEvent::Edit)
            .chain([OrderEvent::Close, OrderEvent::InvoiceSettled]);

        for from in [Pending, InProgress, Completed] {
            for event in events.clone() {
                if let Ok(Invoiced) = from.apply(event, &id()) {
                    assert_eq!(event, OrderEvent::InvoiceSettled);
                    assert_eq!(from, Completed);
                }
            }
        }
    }
}
