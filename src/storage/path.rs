use std::fmt;
use thiserror::Error;

use crate::entities::{image::Purpose, oxford};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("All of family, brand, line, decoration, product and purpose must be filled to build the image path (missing: {0})")]
    MissingField(&'static str),
}

/// Remote directory of a product's images, derived from its taxonomy:
/// `{family}/{brand}/{line}/{decoration}/{productId}/{purpose}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    family: String,
    brand: String,
    line: String,
    decoration: String,
    product_id: String,
    purpose: String,
}

impl ImagePath {
    pub fn new(
        family: &str,
        brand: &str,
        line: &str,
        decoration: &str,
        product_id: &str,
        purpose: &str,
    ) -> Result<Self, PathError> {
        Ok(ImagePath {
            family: segment("family", family)?,
            brand: segment("brand", brand)?,
            line: segment("line", line)?,
            decoration: segment("decoration", decoration)?,
            product_id: required("product", product_id)?.to_string(),
            purpose: required("purpose", purpose)?.to_string(),
        })
    }

    pub fn from_oxford(oxford: &oxford::Model, purpose: Purpose) -> Result<Self, PathError> {
        ImagePath::new(
            oxford.family_description.as_deref().unwrap_or_default(),
            oxford.brand_description.as_deref().unwrap_or_default(),
            oxford.line_description.as_deref().unwrap_or_default(),
            oxford.decoration_description.as_deref().unwrap_or_default(),
            &oxford.product_id,
            purpose.as_str(),
        )
    }

    /// The path with a trailing `/`, as stored on a placeholder image row.
    pub fn directory(&self) -> String {
        format!("{self}/")
    }

    pub fn file(&self, file_name: &str) -> String {
        format!("{self}/{file_name}")
    }
}

impl fmt::Display for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}/{}",
            self.family, self.brand, self.line, self.decoration, self.product_id, self.purpose
        )
    }
}

fn required<'a>(name: &'static str, value: &'a str) -> Result<&'a str, PathError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PathError::MissingField(name));
    }
    Ok(value)
}

fn segment(name: &'static str, value: &str) -> Result<String, PathError> {
    Ok(required(name, value)?
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect())
}

/// Remote paths are relative, forward-slash separated.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Everything before the last `/`; `a/b/` and `a/b/c.jpg` both give `a/b`.
pub fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

pub fn file_name(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    }
}

pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_path_with_underscored_segments() {
        let path = ImagePath::new(
            "Copos",
            "Linha A",
            "Casual Line",
            "Floral Clássico",
            "000123",
            "PRODUTO",
        )
        .unwrap();

        assert_eq!(
            path.to_string(),
            "Copos/Linha_A/Casual_Line/Floral_Clássico/000123/PRODUTO"
        );
        assert_eq!(
            path.directory(),
            "Copos/Linha_A/Casual_Line/Floral_Clássico/000123/PRODUTO/"
        );
    }

    #[test]
    fn trims_before_replacing_whitespace() {
        let path = ImagePath::new(" Pratos ", "B\tC", "L", "D", " 42 ", " DECORACAO ").unwrap();
        assert_eq!(path.to_string(), "Pratos/B_C/L/D/42/DECORACAO");
    }

    #[test]
    fn every_blank_field_is_rejected() {
        let fields = ["family", "brand", "line", "decoration", "product", "purpose"];
        for (blank, name) in fields.iter().enumerate() {
            let mut values = ["a", "b", "c", "d", "e", "f"];
            values[blank] = "  ";
            let result = ImagePath::new(
                values[0], values[1], values[2], values[3], values[4], values[5],
            );
            assert_eq!(result, Err(PathError::MissingField(name)));
        }
    }

    #[test]
    fn oxford_without_description_cannot_build_path() {
        let oxford = oxford::Model {
            id: 1,
            product_id: "000123".into(),
            family_id: "F1".into(),
            family_description: Some("Copos".into()),
            brand_id: "B1".into(),
            brand_description: Some("Linha A".into()),
            decoration_id: "D1".into(),
            decoration_description: None,
            type_id: String::new(),
            type_description: None,
            process_id: String::new(),
            process_description: None,
            situation_id: String::new(),
            situation_description: None,
            line_id: "L1".into(),
            line_description: Some("Casual".into()),
            quality_id: String::new(),
            quality_description: None,
            base_product_id: String::new(),
            base_product_description: None,
            product_group_id: String::new(),
            product_group_description: None,
        };

        assert_eq!(
            ImagePath::from_oxford(&oxford, Purpose::Produto),
            Err(PathError::MissingField("decoration"))
        );
    }

    #[test]
    fn directory_helpers() {
        assert_eq!(parent_dir("a/b/"), "a/b");
        assert_eq!(parent_dir("a/b/c.jpg"), "a/b");
        assert_eq!(parent_dir("c.jpg"), "");
        assert_eq!(file_name("a/b/c.jpg"), "c.jpg");
        assert_eq!(normalize("\\a\\b/c.jpg"), "a/b/c.jpg");
        assert_eq!(join("a/b/", "c.jpg"), "a/b/c.jpg");
        assert_eq!(join("", "c.jpg"), "c.jpg");
    }
}
