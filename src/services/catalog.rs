use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::collections::HashMap;
use tracing::warn;

use super::archive;
use super::dto::{
    AppSearchResponse, ImageBase64, IndexedPaths, InventSummary, ProductApp, ProductComplete,
    ProductData, ProductDetails, ProductOxford, ProductOxfordDetails,
};
use super::image::bundle_images;
use crate::entities::image::{Purpose, PurposeFilter};
use crate::entities::{image, invent, invent_dim, oxford, product};
use crate::error::{AppError, AppResult};
use crate::repositories::{
    ImageRepository, InventDimRepository, InventRepository, OxfordRepository, ProductFilter,
    ProductRepository, TagRepository, TaxInformationRepository,
};
use crate::storage::FileStore;

pub const APP_PAGE_SIZE: u64 = 20;
pub const RANGE_SIZE: u32 = 1000;

fn by_product<T>(rows: Vec<T>, key: impl Fn(&T) -> &str) -> HashMap<String, T> {
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let id = key(&row).to_string();
        map.entry(id).or_insert(row);
    }
    map
}

fn group_by_product<T>(rows: Vec<T>, key: impl Fn(&T) -> &str) -> HashMap<String, Vec<T>> {
    let mut map: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        map.entry(key(&row).to_string()).or_default().push(row);
    }
    map
}

/// Product, taxonomy, physical attributes and tax data for each product, in
/// the order given.
pub async fn assemble_product_data<C: ConnectionTrait>(
    db: &C,
    products: Vec<product::Model>,
) -> AppResult<Vec<ProductData>> {
    let ids: Vec<String> = products.iter().map(|p| p.product_id.clone()).collect();

    let mut oxfords = by_product(OxfordRepository::find_by_products(db, &ids).await?, |o| o.product_id.as_str());
    let mut invents = by_product(InventRepository::find_by_products(db, &ids).await?, |i| i.product_id.as_str());
    let mut taxes = by_product(
        TaxInformationRepository::find_by_products(db, &ids).await?,
        |t| t.product_id.as_str(),
    );

    Ok(products
        .into_iter()
        .map(|product| ProductData {
            oxford: oxfords.remove(&product.product_id),
            invent: invents.remove(&product.product_id),
            tax_information: taxes.remove(&product.product_id),
            product,
        })
        .collect())
}

pub async fn product_data(db: &DatabaseConnection, product_id: &str) -> AppResult<ProductData> {
    let product = ProductRepository::find_by_id(db, product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {product_id}")))?;
    let mut data = assemble_product_data(db, vec![product]).await?;
    data.pop()
        .ok_or_else(|| AppError::Internal("product data went missing".into()))
}

/// Product data for a list of ids; unknown ids are left out.
pub async fn products_data(db: &DatabaseConnection, product_ids: &[String]) -> AppResult<Vec<ProductData>> {
    if product_ids.is_empty() {
        return Err(AppError::Validation("The productIds list is empty".into()));
    }
    let products = ProductRepository::find_by_ids(db, product_ids).await?;
    if products.is_empty() {
        return Err(AppError::NotFound("No product found for the given productIds".into()));
    }
    assemble_product_data(db, products).await
}

/// Six-digit ids `offset..offset + 1000`. An offset of 0 starts at the first
/// product when its id is numeric.
pub fn range_ids(offset: u32, first_product: Option<&str>) -> Vec<String> {
    let start = match (offset, first_product) {
        (0, Some(first)) => first.trim().parse().unwrap_or(0),
        _ => offset,
    };
    (start..start.saturating_add(RANGE_SIZE))
        .map(|id| format!("{id:06}"))
        .collect()
}

pub async fn product_data_range(db: &DatabaseConnection, offset: u32) -> AppResult<Vec<ProductData>> {
    let first = match offset {
        0 => ProductRepository::find_first(db).await?,
        _ => None,
    };
    let ids = range_ids(offset, first.as_ref().map(|p| p.product_id.as_str()));

    let products = ProductRepository::find_by_ids(db, &ids).await?;
    if products.is_empty() {
        return Err(AppError::NotFound("No product found in the requested range".into()));
    }
    assemble_product_data(db, products).await
}

/// Rows matching the taxonomy filter, as product data.
pub async fn oxford_filter(db: &DatabaseConnection, filter: &ProductFilter) -> AppResult<Vec<ProductData>> {
    let products = ProductRepository::filtered(filter).all(db).await?;
    assemble_product_data(db, products).await
}

pub async fn product_details(
    db: &DatabaseConnection,
    status: bool,
    location_id: &str,
) -> AppResult<Vec<ProductDetails>> {
    let products = ProductRepository::find_by_status_and_location(db, status, location_id).await?;

    let mut details = Vec::with_capacity(products.len());
    for data in assemble_product_data(db, products).await? {
        let product_id = data.product.product_id.as_str();
        let location = InventDimRepository::find_at_location(db, product_id, location_id).await?;
        let images =
            ImageRepository::find_by_product(db, product_id, PurposeFilter::Todos, false).await?;

        details.push(ProductDetails {
            location,
            images,
            oxford: data.oxford,
            tax_information: data.tax_information,
            invent: data.invent,
            product: data.product,
        });
    }
    Ok(details)
}

struct Listing {
    product: product::Model,
    oxford: oxford::Model,
    invent: Option<invent::Model>,
    stock: Option<invent_dim::Model>,
}

/// Active products that have a taxonomy row, with their first stock row.
async fn listings(db: &DatabaseConnection, products: Vec<product::Model>) -> AppResult<Vec<Listing>> {
    let ids: Vec<String> = products.iter().map(|p| p.product_id.clone()).collect();

    let mut oxfords = by_product(OxfordRepository::find_by_products(db, &ids).await?, |o| o.product_id.as_str());
    let mut invents = by_product(InventRepository::find_by_products(db, &ids).await?, |i| i.product_id.as_str());
    let mut stock = by_product(InventDimRepository::find_by_products(db, &ids).await?, |d| d.product_id.as_str());

    Ok(products
        .into_iter()
        .filter_map(|product| {
            let oxford = oxfords.remove(&product.product_id)?;
            Some(Listing {
                invent: invents.remove(&product.product_id),
                stock: stock.remove(&product.product_id),
                oxford,
                product,
            })
        })
        .collect())
}

pub async fn product_oxford(db: &DatabaseConnection, filter: &ProductFilter) -> AppResult<Vec<ProductOxford>> {
    let products = ProductRepository::filtered(filter).all(db).await?;
    let listings = listings(db, products).await?;

    let ids: Vec<String> = listings.iter().map(|l| l.product.product_id.clone()).collect();
    let main_images: Vec<image::Model> =
        ImageRepository::find_by_products(db, &ids, PurposeFilter::Produto)
            .await?
            .into_iter()
            .filter(|i| i.image_main)
            .collect();
    let mut thumbs = by_product(main_images, |i| i.product_id.as_str());

    Ok(listings
        .into_iter()
        .map(|l| ProductOxford {
            thumb_url: thumbs
                .remove(&l.product.product_id)
                .map(|i| i.image_path)
                .unwrap_or_default(),
            price: l.stock.as_ref().and_then(|s| s.price).unwrap_or_default(),
            quantity: l.stock.as_ref().and_then(|s| s.quantity).unwrap_or_default(),
            brand: l.oxford.brand_description.unwrap_or_default(),
            line: l.oxford.line_description.unwrap_or_default(),
            decoration: l.oxford.decoration_description.unwrap_or_default(),
            invent: InventSummary::from(l.invent.as_ref()),
            name: l.product.product_name.unwrap_or_default(),
            product_id: l.product.product_id,
        })
        .collect())
}

pub async fn product_oxford_details(
    db: &DatabaseConnection,
    product_ids: &[String],
) -> AppResult<Vec<ProductOxfordDetails>> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = ProductFilter {
        product_id: Some(product_ids.to_vec()),
        ..Default::default()
    };
    let products = ProductRepository::filtered(&filter).all(db).await?;
    let listings = listings(db, products).await?;

    let ids: Vec<String> = listings.iter().map(|l| l.product.product_id.clone()).collect();
    let mut images = group_by_product(
        ImageRepository::find_by_products(db, &ids, PurposeFilter::Produto).await?,
        |i| i.product_id.as_str(),
    );
    let mut tags = group_by_product(
        TagRepository::find_by_products(db, &ids).await?,
        |t| t.product_id.as_str(),
    );

    Ok(listings
        .into_iter()
        .map(|l| {
            let paths = images
                .remove(&l.product.product_id)
                .unwrap_or_default()
                .into_iter()
                .map(|i| i.image_path)
                .collect();
            ProductOxfordDetails {
                tags: tags.remove(&l.product.product_id).unwrap_or_default(),
                images: IndexedPaths(paths),
                price: l.stock.as_ref().and_then(|s| s.price).unwrap_or_default(),
                quantity: l.stock.as_ref().and_then(|s| s.quantity).unwrap_or_default(),
                brand: l.oxford.brand_description.unwrap_or_default(),
                line: l.oxford.line_description.unwrap_or_default(),
                decoration: l.oxford.decoration_description.unwrap_or_default(),
                product_description: l.oxford.base_product_description.unwrap_or_default(),
                invent: InventSummary::from(l.invent.as_ref()),
                name: l.product.product_name.unwrap_or_default(),
                product_id: l.product.product_id,
            }
        })
        .collect())
}

/// One page of the mobile app listing. A product whose images cannot be
/// bundled is still listed, without images.
pub async fn app_search(
    db: &DatabaseConnection,
    store: &dyn FileStore,
    filter: &ProductFilter,
    skip_failed: bool,
) -> AppResult<AppSearchResponse> {
    let page = filter.page.unwrap_or(1).max(1);
    let (products, total) =
        ProductRepository::filtered_page(db, filter, page, APP_PAGE_SIZE).await?;

    let mut listed = Vec::with_capacity(products.len());
    for product in products {
        let images = ImageRepository::find_by_product(
            db,
            &product.product_id,
            Purpose::Produto.into(),
            true,
        )
        .await?;

        let image_zip_base64 = if images.is_empty() {
            None
        } else {
            match bundle_images(store, &images, skip_failed).await {
                Ok(zipped) => Some(archive::encode_base64(&zipped)),
                Err(err) => {
                    warn!(product_id = %product.product_id, error = %err, "Could not bundle product images");
                    None
                }
            }
        };

        listed.push(ProductApp {
            product_id: product.product_id,
            barcode: product.barcode,
            name: product.product_name,
            image_zip_base64,
        });
    }

    Ok(AppSearchResponse {
        total_products: total,
        page,
        page_size: APP_PAGE_SIZE,
        products: listed,
    })
}

/// Everything the app shows for one product; each image is zipped and
/// encoded on its own.
pub async fn app_product(
    db: &DatabaseConnection,
    store: &dyn FileStore,
    product_id: &str,
    skip_failed: bool,
) -> AppResult<ProductComplete> {
    let data = product_data(db, product_id).await?;
    let location = InventDimRepository::find_by_product(db, product_id)
        .await?
        .into_iter()
        .next();
    let tags = TagRepository::find_by_product(db, product_id).await?;

    let mut images = Vec::new();
    for image in ImageRepository::find_by_product(db, product_id, PurposeFilter::Todos, false).await? {
        let encoded = match bundle_images(store, std::slice::from_ref(&image), false).await {
            Ok(zipped) => Some(archive::encode_base64(&zipped)),
            Err(err) if skip_failed => {
                warn!(image_id = image.id, error = %err, "Could not bundle image");
                None
            }
            Err(err) => return Err(err),
        };
        images.push(ImageBase64::new(image, encoded));
    }

    Ok(ProductComplete {
        product: data.product,
        oxford: data.oxford,
        invent: data.invent,
        location,
        tax_information: data.tax_information,
        images,
        tags,
    })
}
