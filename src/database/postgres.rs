use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::database::GameStore;
use crate::entities::{participant_entity as participants, prize_entity as prizes};
use crate::error::{AppError, AppResult};
use crate::models::{Identity, ParticipantEntry, Prize};

/// PostgreSQL 存储（sea-orm）
#[derive(Clone)]
pub struct SeaOrmStore {
    pool: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

fn participant_active_model(entry: &ParticipantEntry) -> participants::ActiveModel {
    participants::ActiveModel {
        id: Set(entry.id),
        establishment_id: Set(entry.establishment_id.clone()),
        email: Set(entry.email.clone()),
        phone: Set(entry.phone.clone()),
        participated_at: Set(entry.participated_at),
        prize_id: Set(entry.prize_id),
        prize_name: Set(entry.prize_name.clone()),
        prize_code: Set(entry.prize_code.clone()),
        redeemed: Set(entry.redeemed),
        redeemed_at: Set(entry.redeemed_at),
    }
}

/// 参与记录表上奖品码的唯一索引名（见 migration）
pub const PRIZE_CODE_UNIQUE_INDEX: &str = "idx_participants_establishment_code_unique";

fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => unique_violation_error(&message),
        _ => AppError::DatabaseError(err),
    }
}

/// 邮箱 / 电话索引冲突为重复参与；奖品码冲突属于内部错误
fn unique_violation_error(message: &str) -> AppError {
    if message.contains(PRIZE_CODE_UNIQUE_INDEX) {
        log::error!("Prize code collision on insert: {message}");
        AppError::InternalError("Prize code collision, please retry".to_string())
    } else {
        AppError::DuplicateParticipation
    }
}

fn identity_condition(establishment_id: &str, identity: &Identity) -> Condition {
    let mut any = Condition::any();
    if let Some(email) = identity.email() {
        any = any.add(participants::Column::Email.eq(email));
    }
    if let Some(phone) = identity.phone() {
        any = any.add(participants::Column::Phone.eq(phone));
    }
    Condition::all()
        .add(participants::Column::EstablishmentId.eq(establishment_id))
        .add(any)
}

#[async_trait]
impl GameStore for SeaOrmStore {
    async fn list_prizes(&self, establishment_id: &str) -> AppResult<Vec<Prize>> {
        let list = prizes::Entity::find()
            .filter(prizes::Column::EstablishmentId.eq(establishment_id))
            .order_by_asc(prizes::Column::CreatedAt)
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn find_prize(
        &self,
        establishment_id: &str,
        prize_id: Uuid,
    ) -> AppResult<Option<Prize>> {
        let model = prizes::Entity::find_by_id(prize_id)
            .filter(prizes::Column::EstablishmentId.eq(establishment_id))
            .one(&self.pool)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn insert_prize(&self, prize: &Prize) -> AppResult<()> {
        let now = Utc::now();
        prizes::ActiveModel {
            id: Set(prize.id),
            establishment_id: Set(prize.establishment_id.clone()),
            name: Set(prize.name.clone()),
            quantity: Set(prize.quantity),
            remaining_quantity: Set(prize.remaining_quantity),
            weight: Set(prize.weight),
            cost_cents: Set(prize.cost_cents),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
        }
        .insert(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_prize(&self, prize: &Prize) -> AppResult<()> {
        let result = prizes::Entity::update_many()
            .col_expr(prizes::Column::Name, Expr::value(prize.name.clone()))
            .col_expr(prizes::Column::Quantity, Expr::value(prize.quantity))
            .col_expr(
                prizes::Column::RemainingQuantity,
                Expr::value(prize.remaining_quantity),
            )
            .col_expr(prizes::Column::Weight, Expr::value(prize.weight))
            .col_expr(prizes::Column::CostCents, Expr::value(prize.cost_cents))
            .col_expr(prizes::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(prizes::Column::Id.eq(prize.id))
            .filter(prizes::Column::EstablishmentId.eq(prize.establishment_id.as_str()))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Prize not found".to_string()));
        }
        Ok(())
    }

    async fn delete_prize(&self, establishment_id: &str, prize_id: Uuid) -> AppResult<bool> {
        let result = prizes::Entity::delete_many()
            .filter(prizes::Column::Id.eq(prize_id))
            .filter(prizes::Column::EstablishmentId.eq(establishment_id))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_participants(&self, establishment_id: &str) -> AppResult<Vec<ParticipantEntry>> {
        let list = participants::Entity::find()
            .filter(participants::Column::EstablishmentId.eq(establishment_id))
            .order_by_desc(participants::Column::ParticipatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn page_participants(
        &self,
        establishment_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<ParticipantEntry>, u64)> {
        let base_query = participants::Entity::find()
            .filter(participants::Column::EstablishmentId.eq(establishment_id));

        let total = base_query.clone().count(&self.pool).await?;

        let items = base_query
            .order_by_desc(participants::Column::ParticipatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.pool)
            .await?;

        Ok((items.into_iter().map(Into::into).collect(), total))
    }

    async fn find_participant(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<Option<ParticipantEntry>> {
        let model = participants::Entity::find_by_id(participant_id)
            .filter(participants::Column::EstablishmentId.eq(establishment_id))
            .one(&self.pool)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_identity(
        &self,
        establishment_id: &str,
        identity: &Identity,
    ) -> AppResult<Option<ParticipantEntry>> {
        let model = participants::Entity::find()
            .filter(identity_condition(establishment_id, identity))
            .one(&self.pool)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn prize_code_exists(&self, establishment_id: &str, prize_code: &str) -> AppResult<bool> {
        let count = participants::Entity::find()
            .filter(participants::Column::EstablishmentId.eq(establishment_id))
            .filter(participants::Column::PrizeCode.eq(prize_code))
            .count(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn insert_participant(&self, entry: &ParticipantEntry) -> AppResult<()> {
        participant_active_model(entry)
            .insert(&self.pool)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn commit_draw(&self, prize: &Prize, entry: &ParticipantEntry) -> AppResult<()> {
        // 事务未提交即被丢弃时自动回滚
        let txn = self.pool.begin().await?;

        // 乐观扣减: 仅当库存仍为快照值时才更新
        let update_result = prizes::Entity::update_many()
            .col_expr(
                prizes::Column::RemainingQuantity,
                Expr::col(prizes::Column::RemainingQuantity).sub(1),
            )
            .col_expr(prizes::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(prizes::Column::Id.eq(prize.id))
            .filter(prizes::Column::EstablishmentId.eq(prize.establishment_id.as_str()))
            .filter(prizes::Column::RemainingQuantity.eq(prize.remaining_quantity + 1))
            .filter(prizes::Column::RemainingQuantity.gt(0))
            .exec(&txn)
            .await?;

        if update_result.rows_affected != 1 {
            return Err(AppError::InventoryError(format!(
                "Stock of prize {} changed during the draw",
                prize.id
            )));
        }

        participant_active_model(entry)
            .insert(&txn)
            .await
            .map_err(map_insert_error)?;

        txn.commit().await?;
        Ok(())
    }

    async fn update_redemption(&self, entry: &ParticipantEntry) -> AppResult<()> {
        let result = participants::Entity::update_many()
            .col_expr(participants::Column::Redeemed, Expr::value(entry.redeemed))
            .col_expr(participants::Column::RedeemedAt, Expr::value(entry.redeemed_at))
            .filter(participants::Column::Id.eq(entry.id))
            .filter(participants::Column::EstablishmentId.eq(entry.establishment_id.as_str()))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Participant not found".to_string()));
        }
        Ok(())
    }

    async fn delete_participant(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<Option<ParticipantEntry>> {
        let txn = self.pool.begin().await?;

        let Some(model) = participants::Entity::find_by_id(participant_id)
            .filter(participants::Column::EstablishmentId.eq(establishment_id))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        participants::Entity::delete_by_id(participant_id)
            .exec(&txn)
            .await?;

        // 奖品已被删除时不做处理
        prizes::Entity::update_many()
            .col_expr(
                prizes::Column::RemainingQuantity,
                Expr::col(prizes::Column::RemainingQuantity).add(1),
            )
            .col_expr(prizes::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(prizes::Column::Id.eq(model.prize_id))
            .filter(
                Expr::col(prizes::Column::RemainingQuantity)
                    .lt(Expr::col(prizes::Column::Quantity)),
            )
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(Some(model.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::{create_pool, run_migrations};

    #[test]
    fn test_unique_violation_mapping() {
        let err = unique_violation_error(
            "duplicate key value violates unique constraint \"idx_participants_establishment_email_unique\"",
        );
        assert!(matches!(err, AppError::DuplicateParticipation));

        let err = unique_violation_error(
            "duplicate key value violates unique constraint \"idx_participants_establishment_phone_unique\"",
        );
        assert!(matches!(err, AppError::DuplicateParticipation));

        let err = unique_violation_error(
            "duplicate key value violates unique constraint \"idx_participants_establishment_code_unique\"",
        );
        assert!(matches!(err, AppError::InternalError(_)));
    }

    fn email(address: &str) -> Identity {
        Identity::new(Some(address), None).unwrap()
    }

    fn taken(prize: &Prize) -> Prize {
        let mut snapshot = prize.clone();
        snapshot.remaining_quantity -= 1;
        snapshot
    }

    /// 需要真实数据库: DATABASE_URL=postgres://... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_commit_draw_against_postgres() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = create_pool(&DatabaseConfig {
            url,
            max_connections: 2,
        })
        .await
        .unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SeaOrmStore::new(pool);
        let establishment_id = format!("it-{}", Uuid::new_v4().simple());

        // 同一快照只能提交一次
        let last = Prize::new(&establishment_id, "Last", 1, 1.0, 100).unwrap();
        store.insert_prize(&last).await.unwrap();
        let snapshot = taken(&last);
        let first = ParticipantEntry::new(&email("a@x.com"), &last, "AAAA1111".into());
        store.commit_draw(&snapshot, &first).await.unwrap();

        let second = ParticipantEntry::new(&email("b@x.com"), &last, "BBBB2222".into());
        let err = store.commit_draw(&snapshot, &second).await.unwrap_err();
        assert!(matches!(err, AppError::InventoryError(_)));
        assert_eq!(store.list_participants(&establishment_id).await.unwrap().len(), 1);

        // 插入失败时扣减随事务回滚
        let pair = Prize::new(&establishment_id, "Pair", 2, 1.0, 100).unwrap();
        store.insert_prize(&pair).await.unwrap();
        let snapshot = taken(&pair);
        let entry = ParticipantEntry::new(&email("c@x.com"), &pair, "CCCC3333".into());
        store.commit_draw(&snapshot, &entry).await.unwrap();

        let next = taken(&snapshot);
        let duplicate = ParticipantEntry::new(&email("c@x.com"), &pair, "DDDD4444".into());
        let err = store.commit_draw(&next, &duplicate).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateParticipation));

        let stored = store
            .find_prize(&establishment_id, pair.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.remaining_quantity, 1);
        assert_eq!(store.list_participants(&establishment_id).await.unwrap().len(), 2);
    }
}
