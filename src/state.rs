//! Application state shared by all handlers: the catalog store and the
//! question generator (which owns the credential rotator).
//!
//! The rotator is the only cross-request mutable state; it guards itself.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::catalog::{CatalogStore, SupabaseCatalog};
use crate::config::Config;
use crate::gemini::Gemini;
use crate::generator::QuestionGenerator;
use crate::rotator::CredentialRotator;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub generator: Arc<QuestionGenerator>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogStore>, generator: QuestionGenerator) -> Self {
        Self {
            catalog,
            generator: Arc::new(generator),
        }
    }

    /// Wire Supabase and Gemini from configuration.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let catalog: Arc<dyn CatalogStore> =
            Arc::new(SupabaseCatalog::new(&cfg.supabase_url, &cfg.supabase_key)?);
        let gemini = Gemini::new(&cfg.gemini_base_url, &cfg.gemini_model, cfg.gemini_timeout)?;

        let rotator = Arc::new(CredentialRotator::new(cfg.gemini_keys.clone()));
        if rotator.is_empty() {
            warn!(target: "question_maker", "GEMINI_API_KEYS is empty; question generation will fail until keys are configured");
        }
        info!(
            target: "question_maker",
            supabase = %cfg.supabase_url,
            model = %gemini.model,
            base_url = %gemini.base_url,
            keys = rotator.len(),
            "Catalog and Gemini configured"
        );

        let generator =
            QuestionGenerator::new(catalog.clone(), Arc::new(gemini), rotator, cfg.prompts.clone());
        Ok(Self::new(catalog, generator))
    }
}
