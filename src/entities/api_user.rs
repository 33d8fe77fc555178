use sea_orm::entity::prelude::*;

use argon2::{password_hash::PasswordVerifier, Argon2, PasswordHash};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "api_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
}

impl Model {
    pub fn check_hash(&self, password: &str) -> Result<(), argon2::password_hash::Error> {
        let parsed_hash = PasswordHash::new(&self.password)?;

        Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
