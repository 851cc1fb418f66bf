use hookflow_types::{ConfigOrigin, Effect, WebhookModel};

use crate::ui::components::ModelCatalog;

/// Palette state derived from the composer text.
///
/// Only the command word filters the list; text after the first space is
/// kept as arguments for the chosen workflow. Unlike the menu, the cursor
/// does not wrap: it is clamped to the filtered list and returns to the
/// first match whenever the filter changes.
#[derive(Debug, Default)]
pub struct SlashPaletteState {
    active: bool,
    query: String,
    arguments: String,
    cursor: usize,
}

impl SlashPaletteState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Re-derive the palette from the composer text after every edit.
    ///
    /// Activating the palette for the first time in a session requests the
    /// model listing.
    pub fn sync(&mut self, composer_input: &str, catalog: &mut ModelCatalog) -> Vec<Effect> {
        let Some(query) = composer_input.strip_prefix('/') else {
            self.dismiss();
            return Vec::new();
        };
        let (command, arguments) = query.split_once(char::is_whitespace).unwrap_or((query, ""));
        self.active = true;
        self.arguments = arguments.trim().to_string();
        if command != self.query {
            self.query = command.to_string();
            self.cursor = 0;
        }
        self.clamp(catalog);
        if catalog.request() { vec![Effect::LoadWebhookModels] } else { Vec::new() }
    }

    pub fn dismiss(&mut self) {
        self.active = false;
        self.query.clear();
        self.arguments.clear();
        self.cursor = 0;
    }

    pub fn matches<'a>(&self, catalog: &'a ModelCatalog) -> Vec<&'a WebhookModel> {
        catalog.filtered(&self.query)
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self, catalog: &ModelCatalog) {
        let count = self.matches(catalog).len();
        if self.cursor + 1 < count {
            self.cursor += 1;
        }
    }

    /// Keep the cursor inside `[0, matches - 1]` (0 when nothing matches).
    pub fn clamp(&mut self, catalog: &ModelCatalog) {
        let count = self.matches(catalog).len();
        self.cursor = self.cursor.min(count.saturating_sub(1));
    }

    /// Pick the highlighted match and close the palette.
    pub fn choose(&mut self, catalog: &ModelCatalog) -> Option<Effect> {
        let model = self.matches(catalog).get(self.cursor).copied()?;
        let effect = Effect::FetchWebhookConfig {
            model_id: model.id.clone(),
            model_name: Some(model.name.clone()),
            origin: ConfigOrigin::Slash {
                arguments: self.arguments.clone(),
            },
        };
        self.dismiss();
        Some(effect)
    }
}
