use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 奖品配置实体（按商户划分）
/// - remaining_quantity: 只在抽奖成功时减 1，或店员调整 quantity 时随之调整
/// - weight: 抽中权重（相对值），> 0 才参与抽奖
/// - cost_cents: 单件成本(分)，统计用
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub establishment_id: String,
    pub name: String,
    pub quantity: i64,
    pub remaining_quantity: i64,
    #[sea_orm(column_type = "Double")]
    pub weight: f64,
    pub cost_cents: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::entities::participant_entity::Entity")]
    Participants,
}

impl Related<crate::entities::participant_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
