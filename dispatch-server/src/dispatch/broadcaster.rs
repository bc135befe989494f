//! Notification Broadcaster
//!
//! Fan-out of "new order available" pushes to every eligible delivery
//! agent plus the shop. Sends run concurrently, each with its own
//! timeout and a bounded retry with backoff; one bad channel never
//! blocks or fails the rest, and the triggering operation never waits
//! for any of it.

use std::time::Duration;

use futures::future::join_all;

use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::{DeliveryAgentRepository, ShopRepository};
use crate::notify::{FanoutFailure, FanoutReport, Notification, NotifyError, OrderPushData};

/// Fire-and-forget broadcast. The caller returns immediately; the outcome
/// is logged from the detached task.
pub fn spawn_broadcast(state: ServerState, order: Order) {
    tokio::spawn(async move {
        let report = broadcast_order(&state, &order).await;
        if report.failed.is_empty() {
            tracing::info!(
                attempted = report.attempted,
                "Order broadcast complete for {}",
                order_key(&order)
            );
        } else {
            tracing::warn!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed.len(),
                "Order broadcast partially failed for {}",
                order_key(&order)
            );
        }
    });
}

/// Notify every eligible agent and the shop about a new order.
///
/// Eligible means available, approved, reachable, and not on the order's
/// ignore list. Returns an aggregate report; never an error.
pub async fn broadcast_order(state: &ServerState, order: &Order) -> FanoutReport {
    let agents = DeliveryAgentRepository::new(state.get_db());
    let shops = ShopRepository::new(state.get_db());

    let mut channels: Vec<String> = Vec::new();
    match agents.find_eligible(order.ignored_by.clone()).await {
        Ok(eligible) => {
            channels.extend(eligible.into_iter().filter_map(|a| a.push_channel));
        }
        Err(e) => {
            tracing::warn!("Eligible agent lookup failed, broadcasting to shop only: {e}");
        }
    }

    let shop_name = match shops.find_by_id(&order.shop).await {
        Ok(Some(shop)) => {
            if let Some(channel) = shop.push_channel {
                channels.push(channel);
            }
            shop.name
        }
        Ok(None) => order.shop.key().to_string(),
        Err(e) => {
            tracing::warn!("Shop lookup failed during broadcast: {e}");
            order.shop.key().to_string()
        }
    };

    let notification = build_notification(order, shop_name);
    fan_out(state, &channels, &notification).await
}

/// Attempts per recipient, with doubling backoff between them
const SEND_ATTEMPTS: u32 = 3;
const RETRY_BASE_MS: u64 = 100;

/// Send one notification to many channels concurrently. Each send gets
/// its own timeout and a bounded retry with backoff.
pub async fn fan_out(
    state: &ServerState,
    channels: &[String],
    notification: &Notification,
) -> FanoutReport {
    let timeout = Duration::from_millis(state.config.notify_timeout_ms);
    let notifier = state.notifier();

    let sends = channels.iter().map(|channel| {
        let notifier = notifier.clone();
        async move {
            let mut outcome = Err(NotifyError::Send("no attempt made".into()));
            for attempt in 0..SEND_ATTEMPTS {
                if attempt > 0 {
                    tokio::time::sleep(Duration::from_millis(RETRY_BASE_MS << attempt)).await;
                }
                outcome = match tokio::time::timeout(
                    timeout,
                    notifier.send(channel, notification),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(NotifyError::Timeout(timeout.as_millis() as u64)),
                };
                if outcome.is_ok() {
                    break;
                }
            }
            (channel.clone(), outcome)
        }
    });

    let mut report = FanoutReport {
        attempted: channels.len(),
        ..Default::default()
    };
    for (channel, outcome) in join_all(sends).await {
        match outcome {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                tracing::warn!("Notification to {channel} failed: {e}");
                report.failed.push(FanoutFailure {
                    channel,
                    error: e.to_string(),
                });
            }
        }
    }
    report
}

/// Best-effort push to the order's customer, detached from the caller.
/// Customers without a registered channel are silently skipped.
pub fn notify_customer(state: &ServerState, order: &Order, title: &str, body: &str) {
    let Some(channel) = order.customer.push_channel.clone() else {
        return;
    };
    let notification = Notification {
        title: title.to_string(),
        body: body.to_string(),
        data: OrderPushData {
            order_id: order_key(order),
            order_code: order.code.clone(),
            shop_name: order.shop.key().to_string(),
            total_items: order.cart.iter().map(|l| l.quantity as usize).sum(),
            total_price: order.total_price,
        },
    };
    let state = state.clone();
    tokio::spawn(async move {
        let report = fan_out(&state, &[channel], &notification).await;
        if !report.failed.is_empty() {
            tracing::warn!("Customer notification failed for {}", notification.data.order_id);
        }
    });
}

fn build_notification(order: &Order, shop_name: String) -> Notification {
    let total_items = order.cart.iter().map(|l| l.quantity as usize).sum();
    Notification {
        title: "New order available".to_string(),
        body: format!(
            "{} has a new order for {:.2}",
            shop_name, order.total_price
        ),
        data: OrderPushData {
            order_id: order_key(order),
            order_code: order.code.clone(),
            shop_name,
            total_items,
            total_price: order.total_price,
        },
    }
}

fn order_key(order: &Order) -> String {
    order
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, ServerState};
    use crate::db::models::{DeliveryAgent, Shop};
    use crate::db::repository::DeliveryAgentRepository;
    use crate::notify::MemoryNotifier;
    use std::sync::Arc;
    use surrealdb::RecordId;

    async fn test_state() -> (ServerState, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let state = ServerState::initialize_in_memory(Config::default(), notifier.clone())
            .await
            .unwrap();
        (state, notifier)
    }

    fn agent(name: &str, channel: Option<&str>, available: bool, approved: bool) -> DeliveryAgent {
        DeliveryAgent {
            id: None,
            name: name.to_string(),
            phone: "000".to_string(),
            is_available: available,
            is_approved: approved,
            push_channel: channel.map(str::to_string),
            location: None,
        }
    }

    fn order_for(shop: RecordId) -> Order {
        Order {
            id: Some(RecordId::from_table_key("order", "o1")),
            code: Some("ORD1".into()),
            cart: Vec::new(),
            shop,
            customer: crate::db::models::CustomerSnapshot {
                id: "u1".into(),
                name: "Alice".into(),
                email: "a@example.com".into(),
                phone: "111".into(),
                push_channel: None,
            },
            status: crate::db::models::OrderStatus::Processing,
            delivery_agent: None,
            ignored_by: Vec::new(),
            otp: "123456".into(),
            user_location: None,
            shipping_address: "Street 1".into(),
            total_price: 25.0,
            payment_info: Default::default(),
            stock_deducted: false,
            stock_restored: false,
            created_at: 0,
            paid_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            cancelled_by: None,
        }
    }

    #[tokio::test]
    async fn broadcasts_to_eligible_agents_and_shop() {
        let (state, notifier) = test_state().await;
        let agents = DeliveryAgentRepository::new(state.get_db());

        agents
            .create(agent("ready", Some("ch-ready"), true, true))
            .await
            .unwrap();
        agents
            .create(agent("offline", Some("ch-offline"), false, true))
            .await
            .unwrap();
        agents
            .create(agent("unapproved", Some("ch-unapproved"), true, false))
            .await
            .unwrap();
        agents
            .create(agent("unreachable", None, true, true))
            .await
            .unwrap();

        let shop = ShopRepository::new(state.get_db())
            .create(Shop {
                id: None,
                name: "Pizza Place".into(),
                push_channel: Some("ch-shop".into()),
                available_balance: 0.0,
            })
            .await
            .unwrap();

        let order = order_for(shop.id.unwrap());
        let report = broadcast_order(&state, &order).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        let channels = notifier.sent_channels();
        assert!(channels.contains(&"ch-ready".to_string()));
        assert!(channels.contains(&"ch-shop".to_string()));
        assert!(!channels.contains(&"ch-offline".to_string()));
    }

    #[tokio::test]
    async fn ignored_agents_are_excluded() {
        let (state, notifier) = test_state().await;
        let agents = DeliveryAgentRepository::new(state.get_db());

        let ignoring = agents
            .create(agent("ignoring", Some("ch-ignoring"), true, true))
            .await
            .unwrap();
        agents
            .create(agent("fresh", Some("ch-fresh"), true, true))
            .await
            .unwrap();

        let shop = ShopRepository::new(state.get_db())
            .create(Shop {
                id: None,
                name: "Sushi Bar".into(),
                push_channel: None,
                available_balance: 0.0,
            })
            .await
            .unwrap();

        let mut order = order_for(shop.id.unwrap());
        order.ignored_by.push(ignoring.id.unwrap());

        let report = broadcast_order(&state, &order).await;

        assert_eq!(report.attempted, 1);
        assert_eq!(notifier.sent_channels(), vec!["ch-fresh".to_string()]);
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_stop_the_rest() {
        let (state, notifier) = test_state().await;
        notifier.fail_channel("ch-bad");

        let channels = vec![
            "ch-good-1".to_string(),
            "ch-bad".to_string(),
            "ch-good-2".to_string(),
        ];
        let notification = build_notification(
            &order_for(RecordId::from_table_key("shop", "s1")),
            "Shop".into(),
        );

        let report = fan_out(&state, &channels, &notification).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].channel, "ch-bad");
        assert_eq!(notifier.sent_count(), 2);
    }

    #[tokio::test]
    async fn flaky_channels_recover_within_the_retry_budget() {
        let (state, notifier) = test_state().await;
        notifier.fail_channel_times("ch-flaky", 2);

        let channels = vec!["ch-flaky".to_string()];
        let notification = build_notification(
            &order_for(RecordId::from_table_key("shop", "s1")),
            "Shop".into(),
        );

        let report = fan_out(&state, &channels, &notification).await;

        assert_eq!(report.succeeded, 1);
        assert!(report.failed.is_empty());
        assert_eq!(notifier.attempts_for("ch-flaky"), 3);
    }

    #[tokio::test]
    async fn permanently_dead_channel_exhausts_its_retries() {
        let (state, notifier) = test_state().await;
        notifier.fail_channel("ch-dead");

        let channels = vec!["ch-dead".to_string()];
        let notification = build_notification(
            &order_for(RecordId::from_table_key("shop", "s1")),
            "Shop".into(),
        );

        let report = fan_out(&state, &channels, &notification).await;

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(notifier.attempts_for("ch-dead"), 3);
    }

    #[tokio::test]
    async fn empty_channel_list_reports_zero_attempts() {
        let (state, _) = test_state().await;
        let notification = build_notification(
            &order_for(RecordId::from_table_key("shop", "s1")),
            "Shop".into(),
        );
        let report = fan_out(&state, &[], &notification).await;
        assert_eq!(report.attempted, 0);
        assert_eq!(report.succeeded, 0);
        assert!(report.failed.is_empty());
    }
}
