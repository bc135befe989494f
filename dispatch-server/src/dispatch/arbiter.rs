//! Assignment Arbiter
//!
//! Decides who wins when several delivery agents accept the same order.
//! The decision itself is a single compare-and-set in the repository; this
//! module adds actor checks and turns a failed guard into the right error
//! by re-reading the order.

use surrealdb::RecordId;

use super::broadcaster;
use super::error::{DispatchError, DispatchResult};
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::{DeliveryAgentRepository, OrderRepository};

/// Accept an order on behalf of a delivery agent.
///
/// Exactly one agent can win; everyone else gets [`DispatchError::AlreadyAssigned`].
/// Re-accepting an order you already hold is a no-op success.
pub async fn accept_order(
    state: &ServerState,
    order_id: &RecordId,
    agent_id: &RecordId,
) -> DispatchResult<Order> {
    let agents = DeliveryAgentRepository::new(state.get_db());
    agents
        .find_by_id(agent_id)
        .await?
        .ok_or_else(|| DispatchError::NotFound(format!("Delivery agent {agent_id} not found")))?;

    let orders = OrderRepository::new(state.get_db());
    if let Some(order) = orders.try_assign(order_id, agent_id).await? {
        tracing::info!("Order {order_id} assigned to agent {agent_id}");
        broadcaster::notify_customer(
            state,
            &order,
            "Order out for delivery",
            &format!(
                "Your order {} is on its way",
                order.code.as_deref().unwrap_or("")
            ),
        );
        return Ok(order);
    }

    // Guard failed; read once to find out why
    let current = orders.require(order_id).await?;
    match &current.delivery_agent {
        Some(assigned) if assigned == agent_id => Ok(current),
        Some(_) => Err(DispatchError::AlreadyAssigned(order_id.to_string())),
        None => Err(DispatchError::InvalidTransition {
            current: current.status,
            action: "accept",
        }),
    }
}

/// Record an agent's explicit decline. The order is never offered to this
/// agent again; it stays available to everyone else.
pub async fn ignore_order(
    state: &ServerState,
    order_id: &RecordId,
    agent_id: &RecordId,
) -> DispatchResult<Order> {
    let orders = OrderRepository::new(state.get_db());
    if let Some(order) = orders.add_ignore(order_id, agent_id).await? {
        return Ok(order);
    }

    let current = orders.require(order_id).await?;
    if current.delivery_agent.as_ref() == Some(agent_id) {
        return Err(DispatchError::Validation(
            "cannot reject an order assigned to you".into(),
        ));
    }
    if current.ignored_by.contains(agent_id) {
        return Err(DispatchError::Validation(
            "order was already rejected".into(),
        ));
    }
    // Guard failed for a reason we cannot name; report the state we saw
    Err(DispatchError::InvalidTransition {
        current: current.status,
        action: "reject",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, ServerState};
    use crate::db::models::{
        CustomerSnapshot, DeliveryAgent, Order, OrderStatus as Status, PaymentInfo,
    };
    use crate::notify::MemoryNotifier;
    use std::sync::Arc;

    async fn test_state() -> ServerState {
        ServerState::initialize_in_memory(Config::default(), Arc::new(MemoryNotifier::new()))
            .await
            .unwrap()
    }

    async fn seed_agent(state: &ServerState, name: &str) -> RecordId {
        DeliveryAgentRepository::new(state.get_db())
            .create(DeliveryAgent {
                id: None,
                name: name.to_string(),
                phone: "000".into(),
                is_available: true,
                is_approved: true,
                push_channel: Some(format!("ch-{name}")),
                location: None,
            })
            .await
            .unwrap()
            .id
            .unwrap()
    }

    async fn seed_order(state: &ServerState) -> RecordId {
        let order = Order {
            id: None,
            code: Some("ORD1".into()),
            cart: Vec::new(),
            shop: RecordId::from_table_key("shop", "s1"),
            customer: CustomerSnapshot {
                id: "u1".into(),
                name: "Alice".into(),
                email: "a@example.com".into(),
                phone: "111".into(),
                push_channel: None,
            },
            status: Status::Processing,
            delivery_agent: None,
            ignored_by: Vec::new(),
            otp: "123456".into(),
            user_location: None,
            shipping_address: "Street 1".into(),
            total_price: 20.0,
            payment_info: PaymentInfo::default(),
            stock_deducted: false,
            stock_restored: false,
            created_at: 0,
            paid_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            cancelled_by: None,
        };
        OrderRepository::new(state.get_db())
            .create_group(vec![order])
            .await
            .unwrap()
            .remove(0)
            .id
            .unwrap()
    }

    #[tokio::test]
    async fn first_acceptance_wins() {
        let state = test_state().await;
        let order_id = seed_order(&state).await;
        let winner = seed_agent(&state, "winner").await;
        let loser = seed_agent(&state, "loser").await;

        let accepted = accept_order(&state, &order_id, &winner).await.unwrap();
        assert_eq!(accepted.status, Status::OutForDelivery);
        assert_eq!(accepted.delivery_agent, Some(winner.clone()));

        let err = accept_order(&state, &order_id, &loser).await.unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyAssigned(_)));
    }

    #[tokio::test]
    async fn reaccepting_own_order_is_a_noop() {
        let state = test_state().await;
        let order_id = seed_order(&state).await;
        let agent = seed_agent(&state, "solo").await;

        accept_order(&state, &order_id, &agent).await.unwrap();
        let again = accept_order(&state, &order_id, &agent).await.unwrap();
        assert_eq!(again.delivery_agent, Some(agent));
        assert_eq!(again.status, Status::OutForDelivery);
    }

    #[tokio::test]
    async fn unknown_agent_cannot_accept() {
        let state = test_state().await;
        let order_id = seed_order(&state).await;
        let ghost = RecordId::from_table_key("delivery_agent", "ghost");

        let err = accept_order(&state, &order_id, &ghost).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_acceptances_produce_exactly_one_winner() {
        let state = test_state().await;
        let order_id = seed_order(&state).await;

        let mut agents = Vec::new();
        for i in 0..8 {
            agents.push(seed_agent(&state, &format!("racer-{i}")).await);
        }

        let mut handles = Vec::new();
        for agent in agents {
            let state = state.clone();
            let order_id = order_id.clone();
            handles.push(tokio::spawn(async move {
                accept_order(&state, &order_id, &agent).await
            }));
        }

        let mut wins = 0;
        let mut losses = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(DispatchError::AlreadyAssigned(_)) => losses += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(losses, 7);

        let order = OrderRepository::new(state.get_db())
            .require(&order_id)
            .await
            .unwrap();
        assert!(order.delivery_agent.is_some());
        assert_eq!(order.status, Status::OutForDelivery);
    }

    #[tokio::test]
    async fn rejection_is_recorded_once_and_sticks() {
        let state = test_state().await;
        let order_id = seed_order(&state).await;
        let agent = seed_agent(&state, "picky").await;

        let order = ignore_order(&state, &order_id, &agent).await.unwrap();
        assert!(order.ignored_by.contains(&agent));

        let err = ignore_order(&state, &order_id, &agent).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[tokio::test]
    async fn assigned_agent_cannot_reject_own_order() {
        let state = test_state().await;
        let order_id = seed_order(&state).await;
        let agent = seed_agent(&state, "committed").await;

        accept_order(&state, &order_id, &agent).await.unwrap();
        let err = ignore_order(&state, &order_id, &agent).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[tokio::test]
    async fn rejection_does_not_block_other_agents() {
        let state = test_state().await;
        let order_id = seed_order(&state).await;
        let picky = seed_agent(&state, "picky").await;
        let eager = seed_agent(&state, "eager").await;

        ignore_order(&state, &order_id, &picky).await.unwrap();
        let accepted = accept_order(&state, &order_id, &eager).await.unwrap();
        assert_eq!(accepted.delivery_agent, Some(eager));
    }
}
