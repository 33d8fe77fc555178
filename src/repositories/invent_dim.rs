use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};

use crate::entities::invent_dim::{self, Entity as InventDim};

pub struct InventDimRepository;

/// Matches a nullable key column, where a missing value only matches NULL.
fn key(column: invent_dim::Column, value: Option<&str>) -> Condition {
    match value {
        Some(value) => Condition::all().add(column.eq(value)),
        None => Condition::all().add(column.is_null()),
    }
}

impl InventDimRepository {
    pub async fn find_by_keys<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
        location_id: Option<&str>,
        company_id: Option<&str>,
    ) -> Result<Option<invent_dim::Model>, DbErr> {
        InventDim::find()
            .filter(invent_dim::Column::ProductId.eq(product_id))
            .filter(key(invent_dim::Column::LocationId, location_id))
            .filter(key(invent_dim::Column::CompanyId, company_id))
            .one(db)
            .await
    }

    pub async fn find_by_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
    ) -> Result<Vec<invent_dim::Model>, DbErr> {
        InventDim::find()
            .filter(invent_dim::Column::ProductId.eq(product_id))
            .order_by_asc(invent_dim::Column::Id)
            .all(db)
            .await
    }

    /// The stock row of a product at one location, if any.
    pub async fn find_at_location<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
        location_id: &str,
    ) -> Result<Option<invent_dim::Model>, DbErr> {
        InventDim::find()
            .filter(invent_dim::Column::ProductId.eq(product_id))
            .filter(invent_dim::Column::LocationId.eq(location_id))
            .order_by_asc(invent_dim::Column::Id)
            .one(db)
            .await
    }

    pub async fn find_by_products<C: ConnectionTrait>(
        db: &C,
        product_ids: &[String],
    ) -> Result<Vec<invent_dim::Model>, DbErr> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        InventDim::find()
            .filter(invent_dim::Column::ProductId.is_in(product_ids.iter().cloned()))
            .order_by_asc(invent_dim::Column::Id)
            .all(db)
            .await
    }

    /// Inserts a new (product, location, company) row or refreshes quantity
    /// and price of the existing one.
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        model: invent_dim::Model,
    ) -> Result<invent_dim::Model, DbErr> {
        let existing = Self::find_by_keys(
            db,
            &model.product_id,
            model.location_id.as_deref(),
            model.company_id.as_deref(),
        )
        .await?;

        match existing {
            Some(existing) => {
                let mut active = existing.into_active_model();
                active.quantity = Set(model.quantity);
                active.price = Set(model.price);
                active.update(db).await
            }
            None => {
                let mut active = model.into_active_model().reset_all();
                active.id = NotSet;
                active.insert(db).await
            }
        }
    }

    /// Like [`Self::upsert`] but never inserts; `None` when no row has the keys.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        model: invent_dim::Model,
    ) -> Result<Option<invent_dim::Model>, DbErr> {
        let existing = Self::find_by_keys(
            db,
            &model.product_id,
            model.location_id.as_deref(),
            model.company_id.as_deref(),
        )
        .await?;

        match existing {
            Some(existing) => {
                let mut active = existing.into_active_model();
                active.quantity = Set(model.quantity);
                active.price = Set(model.price);
                Ok(Some(active.update(db).await?))
            }
            None => Ok(None),
        }
    }

    pub async fn delete_by_keys<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
        location_id: Option<&str>,
        company_id: Option<&str>,
    ) -> Result<bool, DbErr> {
        let result = InventDim::delete_many()
            .filter(invent_dim::Column::ProductId.eq(product_id))
            .filter(key(invent_dim::Column::LocationId, location_id))
            .filter(key(invent_dim::Column::CompanyId, company_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
