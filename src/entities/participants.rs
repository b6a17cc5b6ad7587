use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 参与记录实体
/// 说明:
/// - 同一商户下 email / phone 各自唯一（email 已转小写存储）
/// - prize_name 冗余存储，奖品后续改名不影响历史记录
/// - redeemed_at 仅在 redeemed = true 时有值
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub establishment_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub participated_at: DateTime<Utc>,
    pub prize_id: Uuid,
    pub prize_name: String,
    pub prize_code: String,
    pub redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::prize_entity::Entity",
        from = "Column::PrizeId",
        to = "crate::entities::prize_entity::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Prize,
}

impl Related<crate::entities::prize_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prize.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
