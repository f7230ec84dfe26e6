//! Client side of the flow: configuration persistence, image loading, the
//! proxy call and saving the result.

pub mod api;
pub mod image;
pub mod store;
pub mod validators;

pub use api::ApiClient;
pub use store::{ConfigStore, FileConfigStore, MemoryConfigStore, STORAGE_KEY};
pub use validators::{is_valid_color, is_valid_url, validate_model_config, ValidationReport};

use crate::{
    config::ClientConfig,
    error::{AvatarError, Result},
    models::{BackgroundSpec, GenerateRequest, GenerateResult, ModelConfig},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct AvatarGenerator {
    api: ApiClient,
    store: Arc<dyn ConfigStore>,
    config: ClientConfig,
}

impl AvatarGenerator {
    pub fn new(config: ClientConfig, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            api: ApiClient::new(config.backend_url.clone()),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Validate and persist a model configuration.
    pub async fn configure(&self, model: &ModelConfig) -> Result<()> {
        let report = validate_model_config(model);
        if !report.is_valid() {
            return Err(AvatarError::Validation(report.errors.join("; ")));
        }
        self.store.save(model).await
    }

    pub async fn load_user_image(&self, path: &Path) -> Result<String> {
        image::file_to_data_uri(path).await
    }

    /// One user action: stored config + photo + reference image → proxy.
    pub async fn generate(&self, user_image: &str, background: BackgroundSpec) -> Result<GenerateResult> {
        if user_image.trim().is_empty() {
            return Err(AvatarError::Validation("Please upload a photo first".into()));
        }
        let model = self
            .store
            .load()
            .await?
            .ok_or_else(|| AvatarError::Config("Please configure the AI model first".into()))?;

        let reference_image = image::load_reference_image(&self.config.reference_image_path).await?;

        let request = GenerateRequest {
            user_image: user_image.to_string(),
            reference_image,
            background,
        };
        Ok(self.api.generate_avatar(&model, &request).await)
    }

    /// Save a successful result into the configured output directory.
    pub async fn save(&self, result: &GenerateResult) -> Result<PathBuf> {
        if !result.success || result.image_url.is_empty() {
            return Err(AvatarError::Image("there is no generated avatar to save".into()));
        }
        image::save_avatar(self.api.http(), &result.image_url, &self.config.output_dir).await
    }
}
