use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};

use crate::entities::invent::{self, Entity as Invent};

pub struct InventRepository;

impl InventRepository {
    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<invent::Model>, DbErr> {
        Invent::find()
            .order_by_asc(invent::Column::ProductId)
            .all(db)
            .await
    }

    pub async fn find_by_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
    ) -> Result<Option<invent::Model>, DbErr> {
        Invent::find()
            .filter(invent::Column::ProductId.eq(product_id))
            .one(db)
            .await
    }

    pub async fn find_by_products<C: ConnectionTrait>(
        db: &C,
        product_ids: &[String],
    ) -> Result<Vec<invent::Model>, DbErr> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        Invent::find()
            .filter(invent::Column::ProductId.is_in(product_ids.iter().cloned()))
            .all(db)
            .await
    }

    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        model: invent::Model,
    ) -> Result<invent::Model, DbErr> {
        let existing = Self::find_by_product(db, &model.product_id).await?;
        let mut active = model.into_active_model().reset_all();
        match existing {
            Some(existing) => {
                active.id = Set(existing.id);
                active.update(db).await
            }
            None => {
                active.id = NotSet;
                active.insert(db).await
            }
        }
    }

    pub async fn delete_by_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
    ) -> Result<u64, DbErr> {
        let result = Invent::delete_many()
            .filter(invent::Column::ProductId.eq(product_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
