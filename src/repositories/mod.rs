pub mod api_user;
pub mod image;
pub mod invent;
pub mod invent_dim;
pub mod oxford;
pub mod product;
pub mod tag;
pub mod tax_information;

pub use api_user::ApiUserRepository;
pub use image::ImageRepository;
pub use invent::InventRepository;
pub use invent_dim::InventDimRepository;
pub use oxford::{OxfordRepository, TaxonomyFilter};
pub use product::{ProductFilter, ProductRepository, SearchParams};
pub use tag::TagRepository;
pub use tax_information::TaxInformationRepository;

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

/// Case-insensitive substring match. `%`, `_` and `\` in the needle match
/// themselves. On SQLite `LOWER()` only folds ASCII, so a stored upper-case
/// accented letter (`Á`) is not matched by its lower-case form.
pub(crate) fn contains_ci<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.trim().to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `None` for a missing or empty list, so optional filters collapse the
/// same way either way.
pub(crate) fn non_empty(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|values| !values.is_empty())
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}
