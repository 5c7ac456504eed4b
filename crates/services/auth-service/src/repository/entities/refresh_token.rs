//! Refresh token database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::RefreshToken;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub revoked: bool,
    /// Token that superseded this one (NULL unless rotated)
    pub replaced_by_token: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RefreshToken {
    fn from(model: Model) -> Self {
        RefreshToken {
            id: model.id,
            token: model.token,
            user_id: model.user_id,
            expires_at: model.expires_at,
            created_at: model.created_at,
            revoked: model.revoked,
            replaced_by: model.replaced_by_token,
        }
    }
}

impl From<RefreshToken> for ActiveModel {
    fn from(record: RefreshToken) -> Self {
        ActiveModel {
            id: Set(record.id),
            token: Set(record.token),
            user_id: Set(record.user_id),
            expires_at: Set(record.expires_at),
            created_at: Set(record.created_at),
            revoked: Set(record.revoked),
            replaced_by_token: Set(record.replaced_by),
        }
    }
}
