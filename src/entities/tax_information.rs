use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_tax_information")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: String,
    pub taxation_origin: Option<String>,
    pub tax_fiscal_classification: Option<String>,
    pub product_type: Option<String>,
    pub cest_code: Option<String>,
    pub fiscal_group_id: Option<String>,
    pub approx_tax_value_federal: Option<f64>,
    pub approx_tax_value_state: Option<f64>,
    pub approx_tax_value_city: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
