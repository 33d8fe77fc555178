use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};

use crate::entities::image::{self, Entity as Image, Purpose, PurposeFilter};

pub struct ImageRepository;

impl ImageRepository {
    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: i32,
    ) -> Result<Option<image::Model>, DbErr> {
        Image::find_by_id(id).one(db).await
    }

    /// Images of a product ordered by sequence. `TODOS` matches every purpose.
    pub async fn find_by_product<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
        purpose: PurposeFilter,
        main_only: bool,
    ) -> Result<Vec<image::Model>, DbErr> {
        let mut query = Image::find().filter(image::Column::ProductId.eq(product_id));
        if let Some(purpose) = purpose.purpose() {
            query = query.filter(image::Column::Finalidade.eq(purpose));
        }
        if main_only {
            query = query.filter(image::Column::ImageMain.eq(true));
        }

        query
            .order_by_asc(image::Column::Sequence)
            .order_by_asc(image::Column::Id)
            .all(db)
            .await
    }

    pub async fn find_by_products<C: ConnectionTrait>(
        db: &C,
        product_ids: &[String],
        purpose: PurposeFilter,
    ) -> Result<Vec<image::Model>, DbErr> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query =
            Image::find().filter(image::Column::ProductId.is_in(product_ids.iter().cloned()));
        if let Some(purpose) = purpose.purpose() {
            query = query.filter(image::Column::Finalidade.eq(purpose));
        }

        query
            .order_by_asc(image::Column::ProductId)
            .order_by_asc(image::Column::Sequence)
            .order_by_asc(image::Column::Id)
            .all(db)
            .await
    }

    pub async fn find_one<C: ConnectionTrait>(
        db: &C,
        product_id: &str,
        purpose: Purpose,
        image_path: &str,
    ) -> Result<Option<image::Model>, DbErr> {
        Image::find()
            .filter(image::Column::ProductId.eq(product_id))
            .filter(image::Column::Finalidade.eq(purpose))
            .filter(image::Column::ImagePath.eq(image_path))
            .one(db)
            .await
    }

    pub async fn insert<C: ConnectionTrait>(
        db: &C,
        model: image::Model,
    ) -> Result<image::Model, DbErr> {
        let mut active = model.into_active_model().reset_all();
        active.id = NotSet;
        active.insert(db).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
        let result = Image::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected > 0)
    }
}
