//! Vendor clients built from a website's stored platform connections.

use contentforge_core::{Platform, WebsiteId};
use secrecy::SecretString;
use serde::Serialize;
use tracing::instrument;

use crate::db::{PlatformConfigRepository, RepositoryError};
use crate::error::AppError;
use crate::models::PlatformConfig;
use crate::search_console::SearchConsoleClient;
use crate::shopify::ShopifyClient;
use crate::state::AppState;
use crate::wordpress::WordPressClient;

/// What a successful connection check found.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum VerifiedConnection {
    Shopify {
        shop_name: String,
        domain: String,
    },
    #[serde(rename = "wordpress")]
    WordPress {
        user_id: i64,
        user_name: String,
    },
    SearchConsole {
        sites: Vec<String>,
    },
}

/// Builds clients for one website's connections.
pub struct Connections<'a> {
    state: &'a AppState,
}

impl<'a> Connections<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Load the stored connection for `platform`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the website is not connected.
    pub async fn config(
        &self,
        website_id: WebsiteId,
        platform: Platform,
    ) -> Result<PlatformConfig, AppError> {
        match PlatformConfigRepository::new(self.state.pool())
            .get(website_id, platform)
            .await
        {
            Ok(config) => Ok(config),
            Err(RepositoryError::NotFound) => Err(AppError::BadRequest(format!(
                "{platform} is not connected for this website"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Shopify client for the website's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if Shopify is not connected.
    pub async fn shopify(&self, website_id: WebsiteId) -> Result<ShopifyClient, AppError> {
        let config = self.config(website_id, Platform::Shopify).await?;
        self.shopify_client(&config)
    }

    /// WordPress client for the website.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if WordPress is not connected.
    pub async fn wordpress(&self, website_id: WebsiteId) -> Result<WordPressClient, AppError> {
        let config = self.config(website_id, Platform::WordPress).await?;
        Self::wordpress_client(&config)
    }

    /// Search Console client plus the configured property URL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if Search Console is not connected.
    pub async fn search_console(
        &self,
        website_id: WebsiteId,
    ) -> Result<(SearchConsoleClient, String), AppError> {
        let config = self.config(website_id, Platform::SearchConsole).await?;
        let client = self.search_console_client(&config)?;
        Ok((client, config.base_url))
    }

    /// Call the vendor with the stored credentials.
    ///
    /// # Errors
    ///
    /// Returns the vendor error if the credentials are rejected.
    #[instrument(skip(self, config), fields(platform = %config.platform))]
    pub async fn verify(&self, config: &PlatformConfig) -> Result<VerifiedConnection, AppError> {
        match config.platform {
            Platform::Shopify => {
                let shop = self.shopify_client(config)?.shop().await?;
                Ok(VerifiedConnection::Shopify {
                    shop_name: shop.name,
                    domain: shop.myshopify_domain,
                })
            }
            Platform::WordPress => {
                let me = Self::wordpress_client(config)?.me().await?;
                Ok(VerifiedConnection::WordPress {
                    user_id: me.id,
                    user_name: me.name,
                })
            }
            Platform::SearchConsole => {
                let sites = self.search_console_client(config)?.sites().await?;
                Ok(VerifiedConnection::SearchConsole {
                    sites: sites.into_iter().map(|s| s.site_url).collect(),
                })
            }
        }
    }

    fn shopify_client(&self, config: &PlatformConfig) -> Result<ShopifyClient, AppError> {
        let token = required_secret(config)?;
        Ok(ShopifyClient::new(
            &config.base_url,
            &token,
            &self.state.config().shopify,
            self.state.product_cache().clone(),
        )?)
    }

    fn wordpress_client(config: &PlatformConfig) -> Result<WordPressClient, AppError> {
        let password = required_secret(config)?;
        let username = config
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("wordpress connection has no username".to_string()))?;
        Ok(WordPressClient::new(&config.base_url, username, &password)?)
    }

    fn search_console_client(&self, config: &PlatformConfig) -> Result<SearchConsoleClient, AppError> {
        let token = required_secret(config)?;
        Ok(SearchConsoleClient::new(self.state.http().clone(), token))
    }
}

fn required_secret(config: &PlatformConfig) -> Result<SecretString, AppError> {
    config.secret().ok_or_else(|| {
        AppError::BadRequest(format!("{} connection has no credentials", config.platform))
    })
}
