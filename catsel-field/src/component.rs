//! Widget configuration handed to the admin UI.
//!
//! The UI layer expects a flat object of ui-select options. Keys are
//! camelCase and appear in a fixed order; `options` carries the category
//! forest and `value` the currently selected ids.

use catsel_core::Forest;
use serde::{Deserialize, Serialize};

use crate::error::FieldResult;

/// Static widget options. `Default` is the stock category-select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSettings {
    /// JS component path.
    pub component: String,
    pub template: String,
    pub element_tmpl: String,
    pub data_type: String,
    pub form_element: String,
    pub label: String,
    pub component_type: String,
    pub filter_options: bool,
    pub chips_enabled: bool,
    pub disable_label: bool,
    pub label_visible: bool,
    /// Number of tree levels expanded initially, as the widget expects it.
    pub levels_visibility: String,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            component: "Tudn_SystemCategoriesField/js/components/select-category".to_string(),
            template: "ui/form/field".to_string(),
            element_tmpl: "ui/grid/filters/elements/ui-select".to_string(),
            data_type: "text".to_string(),
            form_element: "select".to_string(),
            label: "Categories".to_string(),
            component_type: "field".to_string(),
            filter_options: true,
            chips_enabled: true,
            disable_label: true,
            label_visible: false,
            levels_visibility: "1".to_string(),
        }
    }
}

impl FieldSettings {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CATSEL_FIELD_LABEL`: field label (default: "Categories")
    /// - `CATSEL_FIELD_LEVELS_VISIBILITY`: expanded levels (default: "1")
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            label: std::env::var("CATSEL_FIELD_LABEL").unwrap_or(defaults.label),
            levels_visibility: std::env::var("CATSEL_FIELD_LEVELS_VISIBILITY")
                .ok()
                .filter(|s| s.parse::<u32>().is_ok())
                .unwrap_or(defaults.levels_visibility),
            ..Self::default()
        }
    }
}

/// The ui-select configuration object for one field instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentJsConfig {
    pub component: String,
    pub template: String,
    pub element_tmpl: String,
    pub data_type: String,
    pub form_element: String,
    pub label: String,
    pub component_type: String,
    pub filter_options: bool,
    pub chips_enabled: bool,
    pub disable_label: bool,
    pub label_visible: bool,
    pub levels_visibility: String,
    /// CSS selector of the hidden native select (`#<html id>`).
    pub element_selector_id: String,
    pub options: Forest,
    pub value: Vec<String>,
}

impl ComponentJsConfig {
    pub fn new(
        settings: &FieldSettings,
        html_id: &str,
        current_value: Option<&str>,
        options: Forest,
    ) -> Self {
        Self {
            component: settings.component.clone(),
            template: settings.template.clone(),
            element_tmpl: settings.element_tmpl.clone(),
            data_type: settings.data_type.clone(),
            form_element: settings.form_element.clone(),
            label: settings.label.clone(),
            component_type: settings.component_type.clone(),
            filter_options: settings.filter_options,
            chips_enabled: settings.chips_enabled,
            disable_label: settings.disable_label,
            label_visible: settings.label_visible,
            levels_visibility: settings.levels_visibility.clone(),
            element_selector_id: format!("#{}", html_id),
            options,
            value: split_value(current_value),
        }
    }

    /// Serialize to the JSON handed to the UI layer.
    pub fn to_json(&self) -> FieldResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Split a stored comma-separated value. Segments are kept verbatim, empty
/// ones included; an absent or empty value selects nothing.
pub fn split_value(current_value: Option<&str>) -> Vec<String> {
    match current_value {
        Some(value) if !value.is_empty() => value.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
