//! Category management, always mediated by the server.

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::info;

use crate::api::ApiClient;
use crate::models::Category;
use crate::notify::{ChangeEvent, ChangeNotifier};

pub struct CategoryService {
    api: ApiClient,
    categories: Vec<Category>,
    admin_categories: Vec<Category>,
    notifier: ChangeNotifier,
}

impl CategoryService {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            categories: Vec::new(),
            admin_categories: Vec::new(),
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.notifier.subscribe()
    }

    /// Storefront categories from the last fetch
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Admin categories from the last fetch or mutation, plus unsaved drafts
    pub fn admin_categories(&self) -> &[Category] {
        &self.admin_categories
    }

    pub async fn get_categories(&mut self) -> Result<&[Category]> {
        self.categories = self.api.fetch_categories().await?;
        Ok(&self.categories)
    }

    pub async fn get_admin_categories(&mut self) -> Result<&[Category]> {
        self.admin_categories = self.api.fetch_admin_categories().await?;
        Ok(&self.admin_categories)
    }

    pub async fn add_category(&mut self, category: &Category) -> Result<()> {
        let admin = self.api.add_category(category).await?;
        info!(name = %category.name, "Category added");
        self.apply_admin_update(admin).await
    }

    pub async fn update_category(&mut self, category: &Category) -> Result<()> {
        let admin = self.api.update_category(category).await?;
        info!(id = category.id, "Category updated");
        self.apply_admin_update(admin).await
    }

    pub async fn delete_category(&mut self, category_id: i32) -> Result<()> {
        let admin = self.api.delete_category(category_id).await?;
        info!(id = category_id, "Category deleted");
        self.apply_admin_update(admin).await
    }

    /// Start a new draft category at the top of the admin list.
    pub fn create_new_category(&mut self) -> Category {
        let category = Category::new_blank();
        self.admin_categories.insert(0, category.clone());
        self.notifier.notify(ChangeEvent::Categories);
        category
    }

    /// The server answers mutations with the fresh admin list; the public
    /// list may have changed too, so it is refetched before notifying.
    async fn apply_admin_update(&mut self, admin: Vec<Category>) -> Result<()> {
        self.admin_categories = admin;
        self.get_categories().await?;
        self.notifier.notify(ChangeEvent::Categories);
        Ok(())
    }
}
