use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock and price of a product at one (location, company).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_invent_dim")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: String,
    pub location_id: Option<String>,
    pub company_id: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
