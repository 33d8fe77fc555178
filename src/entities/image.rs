use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A file on the remote store that belongs to a product.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_image")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: String,
    pub image_path: String,
    #[sea_orm(default_value = 1)]
    pub sequence: i32,
    #[sea_orm(default_value = false)]
    pub image_main: bool,
    pub finalidade: Purpose,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// What an image is used for. Stored as its upper-case tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Purpose {
    #[sea_orm(string_value = "PRODUTO")]
    #[serde(rename = "PRODUTO")]
    Produto,
    #[sea_orm(string_value = "DECORACAO")]
    #[serde(rename = "DECORACAO")]
    Decoracao,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Produto => "PRODUTO",
            Purpose::Decoracao => "DECORACAO",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose as accepted in queries, where `TODOS` matches every purpose.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PurposeFilter {
    #[serde(rename = "PRODUTO")]
    Produto,
    #[serde(rename = "DECORACAO")]
    Decoracao,
    #[serde(rename = "TODOS")]
    Todos,
}

impl PurposeFilter {
    pub fn purpose(self) -> Option<Purpose> {
        match self {
            PurposeFilter::Produto => Some(Purpose::Produto),
            PurposeFilter::Decoracao => Some(Purpose::Decoracao),
            PurposeFilter::Todos => None,
        }
    }
}

impl From<Purpose> for PurposeFilter {
    fn from(value: Purpose) -> Self {
        match value {
            Purpose::Produto => PurposeFilter::Produto,
            Purpose::Decoracao => PurposeFilter::Decoracao,
        }
    }
}
