use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::entities::{
    image::{self, Purpose},
    invent, invent_dim, oxford, product, tag, tax_information,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    pub product: product::Model,
    pub oxford: Option<oxford::Model>,
    pub invent: Option<invent::Model>,
    pub tax_information: Option<tax_information::Model>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub product: product::Model,
    pub oxford: Option<oxford::Model>,
    pub tax_information: Option<tax_information::Model>,
    pub invent: Option<invent::Model>,
    pub location: Option<invent_dim::Model>,
    pub images: Vec<image::Model>,
}

/// Physical attributes with zeroes standing in for unknown values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventSummary {
    pub net_weight: f64,
    pub tara_weight: f64,
    pub gross_weight: f64,
    pub gross_depth: f64,
    pub gross_width: f64,
    pub gross_height: f64,
    pub unit_volume: f64,
    #[serde(rename = "unitVolumeML")]
    pub unit_volume_ml: f64,
    pub nr_of_items: i32,
    pub unit_id: String,
}

impl From<Option<&invent::Model>> for InventSummary {
    fn from(invent: Option<&invent::Model>) -> Self {
        let Some(invent) = invent else {
            return InventSummary::default();
        };
        InventSummary {
            net_weight: invent.net_weight.unwrap_or_default(),
            tara_weight: invent.tara_weight.unwrap_or_default(),
            gross_weight: invent.gross_weight.unwrap_or_default(),
            gross_depth: invent.gross_depth.unwrap_or_default(),
            gross_width: invent.gross_width.unwrap_or_default(),
            gross_height: invent.gross_height.unwrap_or_default(),
            unit_volume: invent.unit_volume.unwrap_or_default(),
            unit_volume_ml: invent.unit_volume_ml.unwrap_or_default(),
            nr_of_items: invent.nr_of_items.unwrap_or_default(),
            unit_id: invent.unit_id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOxford {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub brand: String,
    pub line: String,
    pub decoration: String,
    pub thumb_url: String,
    pub invent: InventSummary,
}

/// Image paths keyed by their position: `{"0": .., "1": .., ..}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedPaths(pub Vec<String>);

impl Serialize for IndexedPaths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, path) in self.0.iter().enumerate() {
            map.serialize_entry(&index.to_string(), path)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOxfordDetails {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub brand: String,
    pub line: String,
    pub decoration: String,
    pub product_description: String,
    pub images: IndexedPaths,
    pub invent: InventSummary,
    pub tags: Vec<tag::Model>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductApp {
    pub product_id: String,
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub image_zip_base64: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSearchResponse {
    pub total_products: u64,
    pub page: u64,
    pub page_size: u64,
    pub products: Vec<ProductApp>,
}

/// An image row together with its file, zipped and base64 encoded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBase64 {
    pub product_id: String,
    pub image_path: String,
    pub sequence: i32,
    pub image_main: bool,
    pub finalidade: Purpose,
    pub images_base64: Option<String>,
}

impl ImageBase64 {
    pub fn new(image: image::Model, images_base64: Option<String>) -> Self {
        ImageBase64 {
            product_id: image.product_id,
            image_path: image.image_path,
            sequence: image.sequence,
            image_main: image.image_main,
            finalidade: image.finalidade,
            images_base64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductComplete {
    pub product: product::Model,
    pub oxford: Option<oxford::Model>,
    pub invent: Option<invent::Model>,
    pub location: Option<invent_dim::Model>,
    pub tax_information: Option<tax_information::Model>,
    pub images: Vec<ImageBase64>,
    pub tags: Vec<tag::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indexed_paths_keep_sequence_order() {
        let paths = IndexedPaths((0..12).map(|i| format!("p/{i}.jpg")).collect());
        let value = serde_json::to_string(&paths).unwrap();

        assert!(value.starts_with(r#"{"0":"p/0.jpg","1":"p/1.jpg","2":"p/2.jpg""#));
        assert!(value.ends_with(r#""10":"p/10.jpg","11":"p/11.jpg"}"#));
    }

    #[test]
    fn missing_invent_is_zeroed() {
        let value = serde_json::to_value(InventSummary::from(None)).unwrap();
        assert_eq!(value["unitVolumeML"], json!(0.0));
        assert_eq!(value["unitId"], json!(""));
    }
}
