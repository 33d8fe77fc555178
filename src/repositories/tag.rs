use sea_orm::{
    sea_query::{Expr, Func, SelectStatement},
    ActiveValue::NotSet,
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, Set,
};

use crate::entities::tag::{self, Entity as Tag};

pub struct TagRepository;

impl TagRepository {
    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, DbErr> {
        Tag::find().order_by_asc(tag::Column::Id).all(db).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<tag::Model>, DbErr> {
        Tag::find_by_id(id).one(db).await
    }

    pub async fn find_by_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
    ) -> Result<Vec<tag::Model>, DbErr> {
        Tag::find()
            .filter(tag::Column::ProductId.eq(product_id))
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await
    }

    pub async fn find_by_products<C: ConnectionTrait>(
        db: &C,
        product_ids: &[String],
    ) -> Result<Vec<tag::Model>, DbErr> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        Tag::find()
            .filter(tag::Column::ProductId.is_in(product_ids.iter().cloned()))
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await
    }

    /// Product ids carrying any of the tags, compared case-insensitively.
    pub fn matching_products(tags: &[String]) -> SelectStatement {
        let tags = tags.iter().map(|t| t.trim().to_lowercase());
        Tag::find()
            .select_only()
            .column(tag::Column::ProductId)
            .filter(Expr::expr(Func::lower(Expr::col(tag::Column::Tag))).is_in(tags))
            .into_query()
    }

    /// Drops the product's current tags and stores `tags` instead. Blank and
    /// repeated values are ignored.
    pub async fn replace_for_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
        tags: &[String],
    ) -> Result<Vec<tag::Model>, DbErr> {
        Tag::delete_many()
            .filter(tag::Column::ProductId.eq(product_id))
            .exec(db)
            .await?;

        let mut seen = std::collections::HashSet::new();
        let rows: Vec<tag::ActiveModel> = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
            .map(|t| tag::ActiveModel {
                id: NotSet,
                tag: Set(t.to_string()),
                product_id: Set(product_id.to_string()),
            })
            .collect();

        if !rows.is_empty() {
            Tag::insert_many(rows).exec_without_returning(db).await?;
        }

        Self::find_by_product(db, product_id).await
    }
}
