use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product taxonomy. One row per product code; every dimension is an
/// id + description pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_oxford")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: String,
    pub family_id: String,
    pub family_description: Option<String>,
    pub brand_id: String,
    pub brand_description: Option<String>,
    pub decoration_id: String,
    pub decoration_description: Option<String>,
    pub type_id: String,
    pub type_description: Option<String>,
    pub process_id: String,
    pub process_description: Option<String>,
    pub situation_id: String,
    pub situation_description: Option<String>,
    pub line_id: String,
    pub line_description: Option<String>,
    pub quality_id: String,
    pub quality_description: Option<String>,
    pub base_product_id: String,
    pub base_product_description: Option<String>,
    pub product_group_id: String,
    pub product_group_description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
