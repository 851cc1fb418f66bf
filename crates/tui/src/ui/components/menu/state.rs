//! State for the workflow dropdown: open/closed phase, filter text, and the
//! wrapping selection over the cached model list.

use hookflow_types::{ConfigOrigin, Effect, WebhookModel};
use ratatui::widgets::ListState;
use tracing::debug;

use crate::ui::components::ModelCatalog;
use crate::ui::components::common::TextInputState;

/// Lifecycle of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuPhase {
    #[default]
    Closed,
    /// The model listing is in flight.
    Loading,
    /// The listing arrived and was empty.
    Empty,
    Populated,
}

#[derive(Debug, Default)]
pub struct WorkflowMenuState {
    phase: MenuPhase,
    filter: TextInputState,
    selected: usize,
    list_state: ListState,
}

impl WorkflowMenuState {
    pub fn phase(&self) -> MenuPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != MenuPhase::Closed
    }

    /// Open the menu. Only the first open of a session requests the listing;
    /// later opens show the cached list.
    pub fn open(&mut self, catalog: &mut ModelCatalog) -> Vec<Effect> {
        self.filter.clear();
        self.selected = 0;
        let mut effects = Vec::new();
        if catalog.request() {
            debug!("requesting webhook model listing");
            effects.push(Effect::LoadWebhookModels);
        }
        self.phase = phase_for(catalog);
        self.sync_list_state(catalog);
        effects
    }

    pub fn close(&mut self) {
        self.phase = MenuPhase::Closed;
    }

    /// Toggle open/closed; returns the effects of opening.
    pub fn toggle(&mut self, catalog: &mut ModelCatalog) -> Vec<Effect> {
        if self.is_open() {
            self.close();
            Vec::new()
        } else {
            self.open(catalog)
        }
    }

    /// The listing arrived; leave `Loading` if the menu is waiting for it.
    pub fn models_loaded(&mut self, catalog: &ModelCatalog) {
        if self.phase == MenuPhase::Loading {
            self.phase = phase_for(catalog);
        }
        self.sync_list_state(catalog);
    }

    pub fn filter(&self) -> &TextInputState {
        &self.filter
    }

    pub fn push_filter_char(&mut self, character: char, catalog: &ModelCatalog) {
        self.filter.insert_char(character);
        self.selected = 0;
        self.sync_list_state(catalog);
    }

    pub fn pop_filter_char(&mut self, catalog: &ModelCatalog) {
        self.filter.backspace();
        self.selected = 0;
        self.sync_list_state(catalog);
    }

    pub fn visible<'a>(&self, catalog: &'a ModelCatalog) -> Vec<&'a WebhookModel> {
        catalog.filtered(self.filter.input())
    }

    /// Advance the selection, wrapping cyclically.
    pub fn select_next(&mut self, catalog: &ModelCatalog) {
        let count = self.visible(catalog).len();
        if count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % count;
        self.list_state.select(Some(self.selected));
    }

    /// Move the selection back, wrapping cyclically.
    pub fn select_prev(&mut self, catalog: &ModelCatalog) {
        let count = self.visible(catalog).len();
        if count == 0 {
            return;
        }
        self.selected = if self.selected == 0 { count - 1 } else { self.selected - 1 };
        self.list_state.select(Some(self.selected));
    }

    pub fn selected<'a>(&self, catalog: &'a ModelCatalog) -> Option<&'a WebhookModel> {
        self.visible(catalog).get(self.selected).copied()
    }

    /// Pick the highlighted model: closes the menu and requests its config.
    pub fn choose(&mut self, catalog: &ModelCatalog) -> Option<Effect> {
        let model = self.selected(catalog)?;
        let effect = Effect::FetchWebhookConfig {
            model_id: model.id.clone(),
            model_name: Some(model.name.clone()),
            origin: ConfigOrigin::Menu,
        };
        self.close();
        Some(effect)
    }

    pub fn list_state(&mut self) -> &mut ListState {
        &mut self.list_state
    }

    fn sync_list_state(&mut self, catalog: &ModelCatalog) {
        let count = self.visible(catalog).len();
        if count == 0 {
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(count - 1);
            self.list_state.select(Some(self.selected));
        }
    }
}

fn phase_for(catalog: &ModelCatalog) -> MenuPhase {
    if catalog.is_loading() {
        MenuPhase::Loading
    } else if catalog.models().is_empty() {
        MenuPhase::Empty
    } else {
        MenuPhase::Populated
    }
}
