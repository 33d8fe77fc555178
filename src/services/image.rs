use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::archive::{self, ArchiveBuilder};
use crate::entities::image::{self, Purpose, PurposeFilter};
use crate::error::{AppError, AppResult};
use crate::repositories::{ImageRepository, OxfordRepository, ProductRepository};
use crate::storage::{path, FileStore, ImagePath};

/// One uploaded file, already read into memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// Image row metadata as sent by clients; the file itself is not touched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub image_path: String,
    #[serde(default = "first_sequence")]
    pub sequence: i32,
    #[serde(default)]
    pub image_main: bool,
    #[serde(default = "product_purpose")]
    pub finalidade: Purpose,
}

fn first_sequence() -> i32 {
    1
}

fn product_purpose() -> Purpose {
    Purpose::Produto
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64ImportRequest {
    pub product_id: String,
    pub finalidade: PurposeFilter,
    #[serde(default)]
    pub base64_images: Vec<String>,
}

/// Replaces the image rows of every product in the batch with the batch.
/// Fails with not-found, and stores nothing, when any product is unknown.
pub async fn create_or_replace_images(
    db: &DatabaseConnection,
    images: Vec<NewImage>,
) -> AppResult<Vec<image::Model>> {
    if images.is_empty() {
        return Err(AppError::Validation("No image was provided".into()));
    }
    if images
        .iter()
        .any(|i| i.product_id.trim().is_empty() || i.image_path.trim().is_empty())
    {
        return Err(AppError::Validation(
            "Every image needs a productId and an imagePath".into(),
        ));
    }

    let mut mains: HashMap<(&str, Purpose), usize> = HashMap::new();
    for image in images.iter().filter(|i| i.image_main) {
        let count = mains.entry((image.product_id.as_str(), image.finalidade)).or_default();
        *count += 1;
        if *count > 1 {
            return Err(AppError::Validation(format!(
                "Product {} has more than one main {} image",
                image.product_id, image.finalidade
            )));
        }
    }

    let mut product_ids: Vec<String> = images.iter().map(|i| i.product_id.clone()).collect();
    product_ids.sort();
    product_ids.dedup();

    let found: HashSet<String> = ProductRepository::find_by_ids(db, &product_ids)
        .await?
        .into_iter()
        .map(|p| p.product_id)
        .collect();
    let missing: Vec<&str> = product_ids
        .iter()
        .filter(|id| !found.contains(*id))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::NotFound(format!(
            "Products not found: {}",
            missing.join(", ")
        )));
    }

    let txn = db.begin().await?;
    for product_id in &product_ids {
        for old in ImageRepository::find_by_product(&txn, product_id, PurposeFilter::Todos, false).await? {
            ImageRepository::delete(&txn, old.id).await?;
        }
    }

    let mut saved = Vec::with_capacity(images.len());
    for image in images {
        let row = ImageRepository::insert(
            &txn,
            image::Model {
                id: 0,
                product_id: image.product_id,
                image_path: path::normalize(image.image_path.trim()),
                sequence: image.sequence,
                image_main: image.image_main,
                finalidade: image.finalidade,
            },
        )
        .await?;
        saved.push(row);
    }
    txn.commit().await?;

    info!(products = product_ids.len(), images = saved.len(), "Image rows replaced");
    Ok(saved)
}

/// Swaps the images of (product, purpose) for `files` in one transaction.
///
/// The first file becomes the main image and sequences start at 1. New
/// products get their directory from the taxonomy; products that already
/// have images keep the directory of the first one. New files are uploaded
/// before the commit and removed again when anything fails, so the rows that
/// survive a failure still point at their files. Old files the new batch did
/// not overwrite are deleted, best effort, once the commit went through.
pub async fn replace_product_images(
    db: &DatabaseConnection,
    store: &dyn FileStore,
    product_id: &str,
    purpose: PurposeFilter,
    files: Vec<UploadFile>,
) -> AppResult<Vec<image::Model>> {
    let product_id = product_id.trim();
    let purpose = purpose.purpose().ok_or_else(|| {
        AppError::Validation("Images must be stored as PRODUTO or DECORACAO".into())
    })?;
    let files: Vec<UploadFile> = files.into_iter().filter(|f| !f.data.is_empty()).collect();
    if product_id.is_empty() {
        return Err(AppError::Validation("Invalid product".into()));
    }
    if files.is_empty() {
        return Err(AppError::Validation("No image was sent".into()));
    }
    if !ProductRepository::exists(db, product_id).await? {
        return Err(AppError::not_found(format!("Product {product_id}")));
    }

    let txn = db.begin().await?;
    let existing =
        ImageRepository::find_by_product(&txn, product_id, purpose.into(), false).await?;

    let dir = match existing.first() {
        Some(first) => path::parent_dir(&path::normalize(&first.image_path)).to_string(),
        None => {
            let oxford = OxfordRepository::find_by_product(&txn, product_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Taxonomy of product {product_id}")))?;
            ImagePath::from_oxford(&oxford, purpose)?.to_string()
        }
    };
    store.ensure_dir(&dir).await?;

    let old_files: Vec<String> = existing
        .iter()
        .map(|old| path::normalize(&old.image_path))
        .filter(|remote| !path::file_name(remote).is_empty())
        .collect();
    for old in &existing {
        ImageRepository::delete(&txn, old.id).await?;
    }

    let mut uploaded = Vec::with_capacity(files.len());
    let saved = match store_files(&txn, store, product_id, purpose, &dir, files, &mut uploaded).await
    {
        Ok(saved) => saved,
        Err(err) => {
            discard_uploads(store, &uploaded, &old_files).await;
            return Err(err);
        }
    };
    if let Err(err) = txn.commit().await {
        discard_uploads(store, &uploaded, &old_files).await;
        return Err(err.into());
    }

    for remote in old_files.iter().filter(|remote| !uploaded.contains(remote)) {
        if let Err(err) = store.delete(remote).await {
            warn!(path = %remote, error = %err, "Could not delete replaced image");
        }
    }

    info!(product_id, %purpose, images = saved.len(), "Product images replaced");
    Ok(saved)
}

/// Uploads `files` into `dir` and inserts their rows. Every path written to
/// the store is pushed to `uploaded`, also when a later step fails.
async fn store_files<C: ConnectionTrait>(
    conn: &C,
    store: &dyn FileStore,
    product_id: &str,
    purpose: Purpose,
    dir: &str,
    files: Vec<UploadFile>,
    uploaded: &mut Vec<String>,
) -> AppResult<Vec<image::Model>> {
    let mut names = HashSet::new();
    let mut saved = Vec::with_capacity(files.len());
    for (index, file) in files.into_iter().enumerate() {
        let name = unique_name(&mut names, &sanitize_file_name(&file.name));
        let target = path::join(dir, &name);
        store.upload(&target, file.data).await?;
        uploaded.push(target.clone());

        let row = ImageRepository::insert(
            conn,
            image::Model {
                id: 0,
                product_id: product_id.to_string(),
                image_path: target,
                sequence: index as i32 + 1,
                image_main: index == 0,
                finalidade: purpose,
            },
        )
        .await?;
        saved.push(row);
    }
    Ok(saved)
}

/// Removes the files of a failed replacement. Paths that belong to the rows
/// being kept were overwritten in place and stay.
async fn discard_uploads(store: &dyn FileStore, uploaded: &[String], keep: &[String]) {
    for remote in uploaded.iter().filter(|remote| !keep.contains(remote)) {
        if let Err(err) = store.delete(remote).await {
            warn!(path = %remote, error = %err, "Could not remove image of a failed replacement");
        }
    }
}

/// Each string is a base64 zip whose first entry is one image.
pub async fn import_base64_images(
    db: &DatabaseConnection,
    store: &dyn FileStore,
    request: Base64ImportRequest,
) -> AppResult<Vec<image::Model>> {
    if request.base64_images.is_empty() {
        return Err(AppError::Validation("No base64 image was sent".into()));
    }

    let mut files = Vec::with_capacity(request.base64_images.len());
    for encoded in &request.base64_images {
        let zipped = archive::decode_base64(encoded)?;
        let entry = archive::first_entry(&zipped)?;
        files.push(UploadFile {
            name: entry.name,
            data: entry.data,
        });
    }

    replace_product_images(db, store, &request.product_id, request.finalidade, files).await
}

/// Zips the files of `images`, one entry per file named by its base name.
/// Rows without a file name (bare directories) are left out.
pub async fn bundle_images(
    store: &dyn FileStore,
    images: &[image::Model],
    skip_failed: bool,
) -> AppResult<Vec<u8>> {
    let mut builder = ArchiveBuilder::new();
    for image in images {
        let remote = path::normalize(image.image_path.trim());
        let name = path::file_name(&remote);
        if name.is_empty() {
            continue;
        }

        match store.download(&remote).await {
            Ok(data) => {
                builder.add(name, &data)?;
            }
            Err(err) if skip_failed => {
                warn!(path = %remote, error = %err, "Image left out of the bundle");
            }
            Err(err) => return Err(err.into()),
        }
    }
    if builder.is_empty() {
        warn!(requested = images.len(), "Image bundle has no entries");
    } else {
        debug!(entries = builder.len(), "Image bundle built");
    }
    Ok(builder.finish()?)
}

/// An image row and its file.
pub async fn download_image(
    db: &DatabaseConnection,
    store: &dyn FileStore,
    id: i32,
) -> AppResult<(image::Model, Vec<u8>)> {
    let image = ImageRepository::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Image {id}")))?;
    let data = store.download(&path::normalize(&image.image_path)).await?;
    Ok((image, data))
}

fn sanitize_file_name(name: &str) -> String {
    let name = path::file_name(&path::normalize(name.trim())).trim().to_string();
    if name.is_empty() {
        return format!("{}.jpg", Uuid::new_v4());
    }
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Keeps names unique within one upload: `a.jpg`, `a_2.jpg`, `a_3.jpg`.
fn unique_name(taken: &mut HashSet<String>, name: &str) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{ext}")),
        _ => (name, String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn image(path: &str) -> image::Model {
        image::Model {
            id: 1,
            product_id: "000123".into(),
            image_path: path.into(),
            sequence: 1,
            image_main: true,
            finalidade: Purpose::Produto,
        }
    }

    #[test]
    fn file_names_are_flattened_and_unique() {
        assert_eq!(sanitize_file_name("C:\\fotos\\copo azul.jpg"), "copo_azul.jpg");
        assert!(sanitize_file_name("  ").ends_with(".jpg"));

        let mut taken = HashSet::new();
        assert_eq!(unique_name(&mut taken, "a.jpg"), "a.jpg");
        assert_eq!(unique_name(&mut taken, "a.jpg"), "a_2.jpg");
        assert_eq!(unique_name(&mut taken, "a.jpg"), "a_3.jpg");
        assert_eq!(unique_name(&mut taken, "noext"), "noext");
        assert_eq!(unique_name(&mut taken, "noext"), "noext_2");
    }

    #[tokio::test]
    async fn bundle_skips_missing_files_when_configured() {
        let store = MemoryStore::new();
        store.insert("Copos/a.jpg", "a");
        let images = [image("/Copos/a.jpg"), image("Copos/missing.jpg"), image("Copos/")];

        let zipped = bundle_images(&store, &images, true).await.unwrap();
        let entries = archive::extract(&zipped).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.jpg");
        assert_eq!(entries[0].data, b"a");

        let result = bundle_images(&store, &images, false).await;
        assert!(matches!(result, Err(AppError::Store(_))));

        let empty = bundle_images(&store, &images[2..], false).await.unwrap();
        assert!(archive::extract(&empty).unwrap().is_empty());
    }
}
