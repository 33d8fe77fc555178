use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::entities::image::{self, Purpose};
use crate::error::AppResult;
use crate::repositories::{ImageRepository, OxfordRepository, ProductRepository};
use crate::storage::{path, FileStore, ImagePath};

/// Directory of the legacy server holding one `P{productId}.jpg` per product.
pub const LEGACY_DIR: &str = "imagens";

/// A legacy file and the product it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyImage {
    pub file_name: String,
    pub product_id: String,
}

impl LegacyImage {
    /// `P000123.jpg` belongs to `000123`; files not starting with `P` are not
    /// product images.
    pub fn parse(file_name: &str) -> Option<Self> {
        let file_name = path::file_name(file_name.trim());
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => file_name,
        };
        let product_id = stem.strip_prefix(['P', 'p'])?.trim_start_matches(['P', 'p']);
        if product_id.is_empty() {
            return None;
        }
        Some(LegacyImage {
            file_name: file_name.to_string(),
            product_id: product_id.to_string(),
        })
    }

    pub fn for_product(product_id: &str) -> Self {
        LegacyImage {
            file_name: format!("P{product_id}.jpg"),
            product_id: product_id.to_string(),
        }
    }
}

/// Copies decoration images from the legacy server into the catalog store.
/// Without product ids every `P*` file of the legacy directory is a
/// candidate. Products that are unknown, lack a complete taxonomy or already
/// have the image are skipped. Returns how many images were copied.
pub async fn sync_legacy_images(
    db: &DatabaseConnection,
    legacy: &dyn FileStore,
    store: &dyn FileStore,
    product_ids: &[String],
) -> AppResult<usize> {
    let candidates: Vec<LegacyImage> = if product_ids.is_empty() {
        legacy
            .list(LEGACY_DIR)
            .await?
            .iter()
            .filter_map(|name| LegacyImage::parse(name))
            .collect()
    } else {
        product_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(LegacyImage::for_product)
            .collect()
    };

    let mut copied = 0;
    for candidate in candidates {
        match sync_one(db, legacy, store, &candidate).await {
            Ok(true) => copied += 1,
            Ok(false) => {}
            Err(err) => {
                warn!(file = %candidate.file_name, error = %err, "Legacy image not synced");
            }
        }
    }

    info!(copied, "Legacy image sync finished");
    Ok(copied)
}

async fn sync_one(
    db: &DatabaseConnection,
    legacy: &dyn FileStore,
    store: &dyn FileStore,
    candidate: &LegacyImage,
) -> AppResult<bool> {
    if !ProductRepository::exists(db, &candidate.product_id).await? {
        return Ok(false);
    }
    let Some(oxford) = OxfordRepository::find_by_product(db, &candidate.product_id).await? else {
        return Ok(false);
    };
    let Ok(dir) = ImagePath::from_oxford(&oxford, Purpose::Decoracao) else {
        return Ok(false);
    };

    let target = dir.file(&candidate.file_name);
    if ImageRepository::find_one(db, &candidate.product_id, Purpose::Decoracao, &target)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    let source = path::join(LEGACY_DIR, &candidate.file_name);
    if !legacy.exists(&source).await? {
        return Ok(false);
    }
    let data = legacy.download(&source).await?;

    store.ensure_dir(&dir.to_string()).await?;
    store.upload(&target, data).await?;

    ImageRepository::insert(
        db,
        image::Model {
            id: 0,
            product_id: candidate.product_id.clone(),
            image_path: target,
            sequence: 1,
            image_main: false,
            finalidade: Purpose::Decoracao,
        },
    )
    .await?;
    Ok(true)
}
