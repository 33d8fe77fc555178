use sea_orm::{
    sea_query::{Expr, SelectStatement},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
};
use serde::Deserialize;

use super::{contains_ci, non_empty};
use crate::entities::oxford::{self, Entity as Oxford};

/// Taxonomy lists of a product filter. A value matches a dimension when it
/// equals the id or is contained (case-insensitively) in the description.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyFilter {
    pub family_id: Option<Vec<String>>,
    pub brand_id: Option<Vec<String>>,
    pub line_id: Option<Vec<String>>,
    pub decoration_id: Option<Vec<String>>,
    pub type_id: Option<Vec<String>>,
    pub process_id: Option<Vec<String>>,
    pub situation_id: Option<Vec<String>>,
    pub quality_id: Option<Vec<String>>,
    pub base_product_id: Option<Vec<String>>,
    pub product_group_id: Option<Vec<String>>,
}

impl TaxonomyFilter {
    fn dimensions(&self) -> [(&Option<Vec<String>>, oxford::Column, oxford::Column); 10] {
        use oxford::Column::*;
        [
            (&self.family_id, FamilyId, FamilyDescription),
            (&self.brand_id, BrandId, BrandDescription),
            (&self.line_id, LineId, LineDescription),
            (&self.decoration_id, DecorationId, DecorationDescription),
            (&self.type_id, TypeId, TypeDescription),
            (&self.process_id, ProcessId, ProcessDescription),
            (&self.situation_id, SituationId, SituationDescription),
            (&self.quality_id, QualityId, QualityDescription),
            (&self.base_product_id, BaseProductId, BaseProductDescription),
            (&self.product_group_id, ProductGroupId, ProductGroupDescription),
        ]
    }

    /// `None` when no dimension is filtered.
    pub fn condition(&self) -> Option<Condition> {
        let mut all = Condition::all();
        let mut any_dimension = false;

        for (values, id, description) in self.dimensions() {
            let Some(values) = non_empty(values) else {
                continue;
            };
            any_dimension = true;

            let mut dimension = Condition::any();
            for value in values {
                dimension = dimension
                    .add(Expr::col(id).eq(value.trim()))
                    .add(contains_ci(description, value));
            }
            all = all.add(dimension);
        }

        any_dimension.then_some(all)
    }
}

pub struct OxfordRepository;

impl OxfordRepository {
    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<oxford::Model>, DbErr> {
        Oxford::find()
            .order_by_asc(oxford::Column::ProductId)
            .all(db)
            .await
    }

    pub async fn find_by_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
    ) -> Result<Option<oxford::Model>, DbErr> {
        Oxford::find()
            .filter(oxford::Column::ProductId.eq(product_id))
            .one(db)
            .await
    }

    pub async fn find_by_products<C: ConnectionTrait>(
        db: &C,
        product_ids: &[String],
    ) -> Result<Vec<oxford::Model>, DbErr> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        Oxford::find()
            .filter(oxford::Column::ProductId.is_in(product_ids.iter().cloned()))
            .all(db)
            .await
    }

    /// Product ids whose taxonomy matches the filter.
    pub fn matching_products(filter: &TaxonomyFilter) -> Option<SelectStatement> {
        filter.condition().map(|condition| {
            Oxford::find()
                .select_only()
                .column(oxford::Column::ProductId)
                .filter(condition)
                .into_query()
        })
    }

    /// Inserts the row or overwrites every field of the product's existing one.
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        model: oxford::Model,
    ) -> Result<oxford::Model, DbErr> {
        match Self::find_by_product(db, &model.product_id).await? {
            Some(existing) => {
                let mut active = model.into_active_model().reset_all();
                active.id = Set(existing.id);
                active.update(db).await
            }
            None => {
                let mut active = model.into_active_model().reset_all();
                active.id = sea_orm::ActiveValue::NotSet;
                active.insert(db).await
            }
        }
    }

    pub async fn delete_by_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
    ) -> Result<u64, DbErr> {
        let result = Oxford::delete_many()
            .filter(oxford::Column::ProductId.eq(product_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
