//! Session cache of webhook-enabled models shared by the menu and the slash
//! palette.

use hookflow_types::WebhookModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CatalogStatus {
    #[default]
    NotRequested,
    Loading,
    Loaded,
}

/// Fetched at most once per session; read-only after it is populated.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    status: CatalogStatus,
    models: Vec<WebhookModel>,
}

impl ModelCatalog {
    /// Mark the listing as requested. Returns `true` only the first time, when
    /// the caller must issue the fetch.
    pub fn request(&mut self) -> bool {
        if self.status == CatalogStatus::NotRequested {
            self.status = CatalogStatus::Loading;
            true
        } else {
            false
        }
    }

    /// Store the listing. Later deliveries are ignored.
    pub fn populate(&mut self, models: Vec<WebhookModel>) {
        if self.status == CatalogStatus::Loaded {
            return;
        }
        self.models = models;
        self.status = CatalogStatus::Loaded;
    }

    pub fn is_loading(&self) -> bool {
        self.status == CatalogStatus::Loading
    }

    pub fn is_loaded(&self) -> bool {
        self.status == CatalogStatus::Loaded
    }

    pub fn models(&self) -> &[WebhookModel] {
        &self.models
    }

    /// Models whose name or slash command contains `query` (case-insensitive).
    pub fn filtered(&self, query: &str) -> Vec<&WebhookModel> {
        let needle = query.to_lowercase();
        self.models.iter().filter(|model| model.matches_query(&needle)).collect()
    }

    pub fn find(&self, model_id: &str) -> Option<&WebhookModel> {
        self.models.iter().find(|model| model.id == model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, command: Option<&str>) -> WebhookModel {
        WebhookModel {
            id: id.into(),
            name: id.to_uppercase(),
            slash_command: command.map(String::from),
            form_title: None,
        }
    }

    #[test]
    fn requests_once_and_keeps_first_listing() {
        let mut catalog = ModelCatalog::default();
        assert!(catalog.request());
        assert!(catalog.is_loading());
        assert!(!catalog.request());

        catalog.populate(vec![model("a", None)]);
        catalog.populate(vec![model("b", None), model("c", None)]);
        assert!(catalog.is_loaded());
        assert_eq!(catalog.models().len(), 1);
        assert!(!catalog.request());
    }

    #[test]
    fn filter_is_case_insensitive() {
        let mut catalog = ModelCatalog::default();
        catalog.populate(vec![model("billing", Some("/Report")), model("ocr", None)]);
        let ids: Vec<_> = catalog.filtered("REP").iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["billing"]);
        assert_eq!(catalog.filtered("").len(), 2);
    }
}
