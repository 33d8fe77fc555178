use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

use crate::entities::api_user::{self, Entity as ApiUser};

pub struct ApiUserRepository;

impl ApiUserRepository {
    pub async fn find_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<Option<api_user::Model>, DbErr> {
        ApiUser::find()
            .filter(api_user::Column::Username.eq(username))
            .one(db)
            .await
    }

    pub async fn username_taken<C: ConnectionTrait>(db: &C, username: &str) -> Result<bool, DbErr> {
        Ok(ApiUser::find()
            .filter(api_user::Column::Username.eq(username))
            .count(db)
            .await?
            > 0)
    }

    /// Stores a user whose password is already hashed.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        username: &str,
        password_hash: String,
    ) -> Result<api_user::Model, DbErr> {
        api_user::ActiveModel {
            username: Set(username.to_string()),
            password: Set(password_hash),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
