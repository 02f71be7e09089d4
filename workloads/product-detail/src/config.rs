//! Controller configuration.
//!
//! Every field has a default matching the storefront's templates, so a
//! config file only needs the values it overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use storefront_widgets::{CarouselOptions, PauseOn, ToastStyle};
use thiserror::Error;

use crate::ids::ProductId;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Product detail page controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdpConfig {
    pub carousel: CarouselConfig,
    pub endpoints: EndpointConfig,
    pub csrf: CsrfConfig,
    pub messages: Messages,
    pub toast: ToastConfig,
    pub cart: CartConfig,
    pub fetch: FetchConfig,
}

impl PdpConfig {
    /// Parse TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as
    /// TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Carousel wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// The main carousel's id is this prefix followed by the product id.
    pub main_id_prefix: String,
    pub main_interval_ms: u64,
    pub main_pause: PauseOn,
    pub main_wrap: bool,
    pub recommended_id: String,
    pub recommended_interval_ms: u64,
    pub recommended_pause: PauseOn,
    pub recommended_wrap: bool,
    pub modal_id: String,
    pub modal_image_id: String,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            main_id_prefix: "productCarousel-".to_string(),
            main_interval_ms: 3000,
            main_pause: PauseOn::Hover,
            main_wrap: true,
            recommended_id: "recommendedCarousel".to_string(),
            recommended_interval_ms: 5000,
            recommended_pause: PauseOn::Never,
            recommended_wrap: true,
            modal_id: "imageModal".to_string(),
            modal_image_id: "modalImage".to_string(),
        }
    }
}

impl CarouselConfig {
    /// Element id of a product's main carousel.
    pub fn main_id(&self, product_id: &ProductId) -> String {
        format!("{}{}", self.main_id_prefix, product_id)
    }

    pub fn main_options(&self) -> CarouselOptions {
        CarouselOptions::new(
            Duration::from_millis(self.main_interval_ms),
            self.main_pause,
            self.main_wrap,
        )
    }

    pub fn recommended_options(&self) -> CarouselOptions {
        CarouselOptions::new(
            Duration::from_millis(self.recommended_interval_ms),
            self.recommended_pause,
            self.recommended_wrap,
        )
    }
}

/// Backend endpoints. `{product_id}` is substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub cart_add: String,
    pub toggle_favorite: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            cart_add: "/cart/add/{product_id}/".to_string(),
            toggle_favorite: "/products/{product_id}/toggle-favorite/".to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn cart_add_url(&self, product_id: &ProductId) -> String {
        self.cart_add.replace("{product_id}", product_id.as_str())
    }

    pub fn toggle_favorite_url(&self, product_id: &ProductId) -> String {
        self.toggle_favorite.replace("{product_id}", product_id.as_str())
    }
}

/// Anti-forgery token names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    pub header: String,
    pub form_field: String,
    pub cookie: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header: "X-CSRFToken".to_string(),
            form_field: "csrfmiddlewaretoken".to_string(),
            cookie: "csrftoken".to_string(),
        }
    }
}

/// Shopper-facing texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub invalid_quantity: String,
    pub csrf_missing: String,
    pub cart_added_label: String,
    pub cart_success_default: String,
    pub cart_failure_default: String,
    pub cart_error_prefix: String,
    pub favorite_added: String,
    pub favorite_removed: String,
    pub favorite_add_label: String,
    pub favorite_remove_label: String,
    pub favorite_failure_default: String,
    pub favorite_error_prefix: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            invalid_quantity: "Veuillez sélectionner une quantité valide.".to_string(),
            csrf_missing: "Erreur: Jeton CSRF manquant.".to_string(),
            cart_added_label: "Ajouté !".to_string(),
            cart_success_default: "Produit ajouté au panier.".to_string(),
            cart_failure_default: "Erreur lors de l'ajout au panier.".to_string(),
            cart_error_prefix: "Erreur lors de l'ajout au panier".to_string(),
            favorite_added: "Produit ajouté aux favoris".to_string(),
            favorite_removed: "Produit retiré des favoris".to_string(),
            favorite_add_label: "Ajouter".to_string(),
            favorite_remove_label: "Retirer".to_string(),
            favorite_failure_default: "Erreur lors de la mise à jour des favoris.".to_string(),
            favorite_error_prefix: "Erreur lors de la mise à jour des favoris".to_string(),
        }
    }
}

/// Toast styling per outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub success: ToastStyle,
    pub error: ToastStyle,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            success: ToastStyle::success(),
            error: ToastStyle::error(),
        }
    }
}

/// Add-to-cart button feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// How long the button shows its "added" state.
    pub revert_after_ms: u64,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            revert_after_ms: 2000,
        }
    }
}

impl CartConfig {
    pub fn revert_after(&self) -> Duration {
        Duration::from_millis(self.revert_after_ms)
    }
}

/// Background request policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request deadline; unset means no deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = PdpConfig::from_toml_str(
            r#"
            [carousel]
            main_interval_ms = 4000

            [messages]
            favorite_add_label = "Add"

            [fetch]
            timeout_ms = 8000
            "#,
        )
        .unwrap();

        assert_eq!(config.carousel.main_interval_ms, 4000);
        assert_eq!(config.carousel.recommended_interval_ms, 5000);
        assert_eq!(config.messages.favorite_add_label, "Add");
        assert_eq!(config.messages.favorite_remove_label, "Retirer");
        assert_eq!(config.fetch.timeout(), Some(Duration::from_secs(8)));
        assert_eq!(config.cart.revert_after(), Duration::from_millis(2000));
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let config = PdpConfig::default();
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(PdpConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn test_endpoint_substitution() {
        let endpoints = EndpointConfig::default();
        let id = ProductId::new("42");
        assert_eq!(endpoints.cart_add_url(&id), "/cart/add/42/");
        assert_eq!(endpoints.toggle_favorite_url(&id), "/products/42/toggle-favorite/");
    }

    #[test]
    fn test_pause_mode_names() {
        let config = PdpConfig::from_toml_str(
            r#"
            [carousel]
            main_pause = "never"
            "#,
        )
        .unwrap();
        assert_eq!(config.carousel.main_pause, PauseOn::Never);
        assert!(PdpConfig::from_toml_str("[carousel]\nmain_pause = \"sometimes\"").is_err());
    }
}
