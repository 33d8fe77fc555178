pub mod api_user;
pub mod image;
pub mod invent;
pub mod invent_dim;
pub mod oxford;
pub mod product;
pub mod tag;
pub mod tax_information;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::entities::{
    api_user::Entity as ApiUser, image::Entity as Image, invent::Entity as Invent,
    invent_dim::Entity as InventDim, oxford::Entity as Oxford, product::Entity as Product,
    tag::Entity as Tag, tax_information::Entity as TaxInformation,
};

/// Creates every table (and its indexes) that does not exist yet.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Oxford).await?;
    create_table(db, &schema, Invent).await?;
    create_table(db, &schema, InventDim).await?;
    create_table(db, &schema, TaxInformation).await?;
    create_table(db, &schema, Image).await?;
    create_table(db, &schema, Tag).await?;
    create_table(db, &schema, ApiUser).await?;

    info!("Database schema is up to date");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    Ok(())
}
