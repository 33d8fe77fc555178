use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select,
    Set,
};
use serde::Deserialize;
use validator::Validate;

use super::{contains_ci, non_blank, non_empty, OxfordRepository, TagRepository, TaxonomyFilter};
use crate::entities::{
    image::{self, Entity as Image, Purpose},
    invent_dim::{self, Entity as InventDim},
    oxford::{self, Entity as Oxford},
    product::{self, Entity as Product},
};

pub const SEARCH_LIMIT: u64 = 21;

/// Free-text search over product id, barcode, name and the taxonomy
/// descriptions. Every field is a case-insensitive substring.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub product: Option<String>,
    pub barcode: Option<String>,
    pub family: Option<String>,
    pub brand: Option<String>,
    pub line: Option<String>,
    pub decoration: Option<String>,
    #[serde(alias = "nome")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub product_id: Option<Vec<String>>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub taxonomy: TaxonomyFilter,
    pub has_main_image: Option<bool>,
    pub tags: Option<Vec<String>>,
    #[validate(range(min = 1, message = "page starts at 1"))]
    pub page: Option<u64>,
}

pub struct ProductRepository;

impl ProductRepository {
    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<product::Model>, DbErr> {
        Product::find()
            .order_by_asc(product::Column::ProductId)
            .all(db)
            .await
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
    ) -> Result<Option<product::Model>, DbErr> {
        Product::find_by_id(product_id).one(db).await
    }

    pub async fn exists<C: ConnectionTrait>(db: &C, product_id: &str) -> Result<bool, DbErr> {
        Ok(Product::find_by_id(product_id).count(db).await? > 0)
    }

    pub async fn find_by_ids<C: ConnectionTrait>(
        db: &C,
        product_ids: &[String],
    ) -> Result<Vec<product::Model>, DbErr> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        Product::find()
            .filter(product::Column::ProductId.is_in(product_ids.iter().cloned()))
            .order_by_asc(product::Column::ProductId)
            .all(db)
            .await
    }

    pub async fn find_first<C: ConnectionTrait>(db: &C) -> Result<Option<product::Model>, DbErr> {
        Product::find()
            .order_by_asc(product::Column::ProductId)
            .one(db)
            .await
    }

    pub async fn search<C: ConnectionTrait>(
        db: &C,
        params: &SearchParams,
    ) -> Result<Vec<product::Model>, DbErr> {
        let descriptions = [
            (&params.family, oxford::Column::FamilyDescription),
            (&params.brand, oxford::Column::BrandDescription),
            (&params.line, oxford::Column::LineDescription),
            (&params.decoration, oxford::Column::DecorationDescription),
        ];

        let mut query = Product::find()
            .filter(product::Column::Status.eq(true))
            .apply_if(non_blank(&params.product), |q, v| {
                q.filter(contains_ci(product::Column::ProductId, v))
            })
            .apply_if(non_blank(&params.barcode), |q, v| {
                q.filter(contains_ci(product::Column::Barcode, v))
            })
            .apply_if(non_blank(&params.name), |q, v| {
                q.filter(contains_ci(product::Column::ProductName, v))
            });

        for (value, column) in descriptions {
            if let Some(value) = non_blank(value) {
                let matching = Oxford::find()
                    .select_only()
                    .column(oxford::Column::ProductId)
                    .filter(contains_ci(column, value))
                    .into_query();
                query = query.filter(product::Column::ProductId.in_subquery(matching));
            }
        }

        query
            .order_by_asc(product::Column::ProductId)
            .limit(SEARCH_LIMIT)
            .all(db)
            .await
    }

    /// Active products matching the filter, ordered by id.
    pub fn filtered(filter: &ProductFilter) -> Select<Product> {
        let main_images = || {
            Image::find()
                .select_only()
                .column(image::Column::ProductId)
                .filter(image::Column::ImageMain.eq(true))
                .filter(image::Column::Finalidade.eq(Purpose::Produto))
                .into_query()
        };

        Product::find()
            .filter(product::Column::Status.eq(true))
            .apply_if(non_empty(&filter.product_id), |q, ids| {
                q.filter(product::Column::ProductId.is_in(ids.iter().cloned()))
            })
            .apply_if(non_blank(&filter.name), |q, name| {
                q.filter(contains_ci(product::Column::ProductName, name))
            })
            .apply_if(
                OxfordRepository::matching_products(&filter.taxonomy),
                |q, matching| q.filter(product::Column::ProductId.in_subquery(matching)),
            )
            .apply_if(filter.has_main_image, |q, has_main| {
                if has_main {
                    q.filter(product::Column::ProductId.in_subquery(main_images()))
                } else {
                    q.filter(product::Column::ProductId.not_in_subquery(main_images()))
                }
            })
            .apply_if(non_empty(&filter.tags), |q, tags| {
                q.filter(product::Column::ProductId.in_subquery(TagRepository::matching_products(tags)))
            })
            .order_by_asc(product::Column::ProductId)
    }

    /// One page of [`Self::filtered`] plus the total number of matches.
    pub async fn filtered_page<C: ConnectionTrait>(
        db: &C,
        filter: &ProductFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<product::Model>, u64), DbErr> {
        let paginator = Self::filtered(filter).paginate(db, page_size);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((products, total))
    }

    /// Products with the given status that have a stock row at the location.
    pub async fn find_by_status_and_location<C: ConnectionTrait>(
        db: &C,
        status: bool,
        location_id: &str,
    ) -> Result<Vec<product::Model>, DbErr> {
        let stocked = InventDim::find()
            .select_only()
            .column(invent_dim::Column::ProductId)
            .filter(invent_dim::Column::LocationId.eq(location_id))
            .into_query();

        Product::find()
            .filter(product::Column::Status.eq(status))
            .filter(product::Column::ProductId.in_subquery(stocked))
            .order_by_asc(product::Column::ProductId)
            .all(db)
            .await
    }

    /// Creates missing products; existing ones only get name and barcode
    /// refreshed.
    pub async fn upsert<C: ConnectionTrait>(db: &C, model: product::Model) -> Result<(), DbErr> {
        match Self::find_by_id(db, &model.product_id).await? {
            Some(existing) => {
                let mut active = existing.into_active_model();
                active.product_name = Set(model.product_name);
                active.barcode = Set(model.barcode);
                active.update(db).await?;
            }
            None => {
                Product::insert(model.into_active_model().reset_all())
                    .exec_without_returning(db)
                    .await?;
            }
        }
        Ok(())
    }

    /// Replaces every column of an existing product. `None` when it does not
    /// exist.
    pub async fn replace<C: ConnectionTrait>(
        db: &C,
        model: product::Model,
    ) -> Result<Option<product::Model>, DbErr> {
        if !Self::exists(db, &model.product_id).await? {
            return Ok(None);
        }
        let updated = model.into_active_model().reset_all().update(db).await?;
        Ok(Some(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, product_id: &str) -> Result<bool, DbErr> {
        let result = Product::delete_by_id(product_id).exec(db).await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbBackend;

    fn sql(filter: &ProductFilter) -> String {
        ProductRepository::filtered(filter)
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn bare_filter_only_keeps_active_products() {
        let sql = sql(&ProductFilter::default());
        assert!(sql.contains(r#""product"."status" = "#), "{sql}");
        assert!(!sql.contains("IN (SELECT"), "{sql}");
    }

    #[test]
    fn empty_lists_are_ignored() {
        let filter = ProductFilter {
            product_id: Some(vec![]),
            tags: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(sql(&filter), sql(&ProductFilter::default()));
    }

    #[test]
    fn main_image_filter_uses_product_purpose() {
        let filter = ProductFilter {
            has_main_image: Some(false),
            ..Default::default()
        };
        let sql = sql(&filter);
        assert!(sql.contains("NOT IN (SELECT"), "{sql}");
        assert!(sql.contains("'PRODUTO'"), "{sql}");
    }

    #[test]
    fn filter_deserializes_flattened_taxonomy() {
        let filter: ProductFilter = serde_json::from_value(serde_json::json!({
            "decorationId": ["floral"],
            "hasMainImage": true,
            "page": 2
        }))
        .unwrap();

        assert_eq!(filter.taxonomy.decoration_id, Some(vec!["floral".to_string()]));
        assert_eq!(filter.has_main_image, Some(true));
        assert_eq!(filter.page, Some(2));
        assert!(filter.validate().is_ok());
    }
}
