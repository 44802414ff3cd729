//! Product and category operations.
//!
//! Reads are public. Writes need a logged-in principal.

use cartwright_core::{AccessPolicy, CategoryId, Operation, Principal, ProductId};

use super::{CollectionError, authorize, hooks};
use crate::db::{ProductFilter, Store};
use crate::models::{
    Category, CategoryDraft, CategoryPatch, Product, ProductDraft, ProductPatch, parent_filter,
};

const POLICY: AccessPolicy = AccessPolicy::CATALOG;

/// Product and category service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// # Errors
    ///
    /// `NotFound` if the product does not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, CollectionError> {
        self.store
            .find_product(id)
            .await?
            .ok_or(CollectionError::NotFound)
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn products(&self, filter: ProductFilter) -> Result<Vec<Product>, CollectionError> {
        Ok(self.store.list_products(filter).await?)
    }

    /// Create a product. A missing inventory count is stored as 0.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `Validation`, `Conflict` for a taken name or SKU, and
    /// `InvalidReference` for unknown categories or images.
    pub async fn create_product(
        &self,
        user: Option<&Principal>,
        patch: ProductPatch,
    ) -> Result<Product, CollectionError> {
        authorize(&POLICY, Operation::Create, user, None)?;

        let mut draft = ProductDraft::default();
        draft.apply(patch);
        hooks::initiate_inventory(&mut draft);
        let data = draft.validate()?;

        let product = self.store.insert_product(&data).await?;
        tracing::info!(product_id = %product.id, sku = %product.data.sku, "Product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Same as [`Self::create_product`], plus `NotFound`.
    pub async fn update_product(
        &self,
        user: Option<&Principal>,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, CollectionError> {
        authorize(&POLICY, Operation::Update, user, None)?;
        let existing = self.product(id).await?;

        let mut draft = ProductDraft::from(existing.data);
        draft.apply(patch);
        let data = draft.validate()?;

        Ok(self.store.update_product(id, &data).await?)
    }

    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, or `Conflict` while an order references it.
    pub async fn delete_product(
        &self,
        user: Option<&Principal>,
        id: ProductId,
    ) -> Result<ProductId, CollectionError> {
        authorize(&POLICY, Operation::Delete, user, None)?;
        if self.store.delete_product(id).await? {
            tracing::info!(product_id = %id, "Product deleted");
            Ok(id)
        } else {
            Err(CollectionError::NotFound)
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// `NotFound` if the category does not exist.
    pub async fn category(&self, id: CategoryId) -> Result<Category, CollectionError> {
        self.store
            .find_category(id)
            .await?
            .ok_or(CollectionError::NotFound)
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn categories(&self) -> Result<Vec<Category>, CollectionError> {
        Ok(self.store.list_categories().await?)
    }

    /// # Errors
    ///
    /// `Forbidden`, `Validation`, `Conflict` for a taken name, and
    /// `InvalidReference` for an unknown parent or image.
    pub async fn create_category(
        &self,
        user: Option<&Principal>,
        patch: CategoryPatch,
    ) -> Result<Category, CollectionError> {
        authorize(&POLICY, Operation::Create, user, None)?;

        let mut draft = CategoryDraft::default();
        draft.apply(patch);
        let data = draft.validate(None)?;

        let category = self.store.insert_category(&data).await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Same as [`Self::create_category`], plus `NotFound`. A category that
    /// names itself as parent fails validation.
    pub async fn update_category(
        &self,
        user: Option<&Principal>,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, CollectionError> {
        authorize(&POLICY, Operation::Update, user, None)?;
        let existing = self.category(id).await?;

        let mut draft = CategoryDraft::from(existing.data);
        draft.apply(patch);
        let data = draft.validate(Some(id))?;

        Ok(self.store.update_category(id, &data).await?)
    }

    /// Children are detached and product assignments dropped.
    ///
    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    pub async fn delete_category(
        &self,
        user: Option<&Principal>,
        id: CategoryId,
    ) -> Result<CategoryId, CollectionError> {
        authorize(&POLICY, Operation::Delete, user, None)?;
        if self.store.delete_category(id).await? {
            tracing::info!(category_id = %id, "Category deleted");
            Ok(id)
        } else {
            Err(CollectionError::NotFound)
        }
    }

    /// Categories selectable as the parent of `id`: everything but itself.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` does not exist.
    pub async fn parent_options(&self, id: CategoryId) -> Result<Vec<Category>, CollectionError> {
        self.category(id).await?;
        let filter = parent_filter(Some(id));
        Ok(self
            .categories()
            .await?
            .into_iter()
            .filter(|c| filter.allows(c.id))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwright_core::{Cents, MediaId};

    use super::*;
    use crate::db::CategoryStore;
    use crate::models::ProductImage;
    use crate::test_support::category;

    const ADMIN: Principal = Principal::admin(1);

    fn mug() -> ProductPatch {
        ProductPatch {
            name: Some("Enamel Mug".to_owned()),
            price: Some(Cents::new(1800)),
            sku: Some("MUG-001".to_owned()),
            ..ProductPatch::default()
        }
    }

    #[tokio::test]
    async fn test_create_product_defaults_inventory() {
        let store = crate::db::MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let product = catalog.create_product(Some(&ADMIN), mug()).await.unwrap();
        assert_eq!(product.data.inventory, 0);
        assert_eq!(product.data.slug.as_str(), "enamel-mug");
    }

    #[tokio::test]
    async fn test_product_writes_need_login() {
        let store = crate::db::MemoryStore::new();
        let catalog = CatalogService::new(&store);

        assert!(matches!(
            catalog.create_product(None, mug()).await,
            Err(CollectionError::Forbidden)
        ));
        // Any logged-in principal may write the catalog
        let customer = Principal::customer(9);
        assert!(catalog.create_product(Some(&customer), mug()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_keeps_inventory_and_checks_sku() {
        let store = crate::db::MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let product = catalog
            .create_product(
                Some(&ADMIN),
                ProductPatch {
                    inventory: Some(7),
                    ..mug()
                },
            )
            .await
            .unwrap();

        let updated = catalog
            .update_product(
                Some(&ADMIN),
                product.id,
                ProductPatch {
                    featured: Some(true),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.data.inventory, 7);
        assert!(updated.data.featured);

        let err = catalog
            .update_product(
                Some(&ADMIN),
                product.id,
                ProductPatch {
                    sku: Some("MU".to_owned()),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_image_is_invalid_reference() {
        let store = crate::db::MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let err = catalog
            .create_product(
                Some(&ADMIN),
                ProductPatch {
                    images: Some(vec![ProductImage {
                        image: MediaId::new(77),
                        alt_text: None,
                        is_primary: true,
                    }]),
                    ..mug()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_parent_options_exclude_self() {
        let store = crate::db::MemoryStore::new();
        let kitchen = store.insert_category(&category("Kitchen", None)).await.unwrap();
        let mugs = store
            .insert_category(&category("Mugs", Some(kitchen.id)))
            .await
            .unwrap();
        let catalog = CatalogService::new(&store);

        let options = catalog.parent_options(mugs.id).await.unwrap();
        let ids: Vec<_> = options.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![kitchen.id]);

        assert!(matches!(
            catalog.parent_options(CategoryId::new(404)).await,
            Err(CollectionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_category_cannot_parent_itself() {
        let store = crate::db::MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let kitchen = catalog
            .create_category(
                Some(&ADMIN),
                CategoryPatch {
                    name: Some("Kitchen".to_owned()),
                    ..CategoryPatch::default()
                },
            )
            .await
            .unwrap();

        let err = catalog
            .update_category(
                Some(&ADMIN),
                kitchen.id,
                CategoryPatch {
                    parent: Some(Some(kitchen.id)),
                    ..CategoryPatch::default()
                },
            )
            .await
            .unwrap_err();
        let CollectionError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.fields(), vec!["parent"]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = crate::db::MemoryStore::new();
        let catalog = CatalogService::new(&store);
        assert!(matches!(
            catalog.delete_category(Some(&ADMIN), CategoryId::new(1)).await,
            Err(CollectionError::NotFound)
        ));
        assert!(matches!(
            catalog.delete_product(Some(&ADMIN), ProductId::new(1)).await,
            Err(CollectionError::NotFound)
        ));
    }
}
