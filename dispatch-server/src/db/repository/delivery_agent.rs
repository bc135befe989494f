//! Delivery Agent Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::DeliveryAgent;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const AGENT_TABLE: &str = "delivery_agent";

#[derive(Clone)]
pub struct DeliveryAgentRepository {
    base: BaseRepository,
}

impl DeliveryAgentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<DeliveryAgent>> {
        let agent: Option<DeliveryAgent> = self.base.db().select(id.clone()).await?;
        Ok(agent)
    }

    pub async fn create(&self, agent: DeliveryAgent) -> RepoResult<DeliveryAgent> {
        let created: Option<DeliveryAgent> =
            self.base.db().create(AGENT_TABLE).content(agent).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create delivery agent".to_string()))
    }

    /// Broadcast eligibility: available, approved, reachable, and not on the
    /// order's ignore list.
    pub async fn find_eligible(&self, ignored: Vec<RecordId>) -> RepoResult<Vec<DeliveryAgent>> {
        let agents: Vec<DeliveryAgent> = self
            .base
            .db()
            .query(
                "SELECT * FROM delivery_agent \
                 WHERE is_available = true AND is_approved = true \
                 AND push_channel != NONE AND id NOTINSIDE $ignored",
            )
            .bind(("ignored", ignored))
            .await?
            .take(0)?;
        Ok(agents)
    }
}
