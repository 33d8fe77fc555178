use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_invent")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: String,
    pub net_weight: Option<f64>,
    pub tara_weight: Option<f64>,
    pub gross_weight: Option<f64>,
    pub gross_depth: Option<f64>,
    pub gross_width: Option<f64>,
    pub gross_height: Option<f64>,
    pub unit_volume: Option<f64>,
    #[serde(rename = "unitVolumeML")]
    pub unit_volume_ml: Option<f64>,
    pub nr_of_items: Option<i32>,
    pub unit_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
