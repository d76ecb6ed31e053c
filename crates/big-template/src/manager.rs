//! Active template tracking.
//!
//! The manager holds one *active* template, starting out as the empty
//! template. Loading a template makes it active. Once a template is active,
//! asking for "the default" (id 0) keeps the current one instead of
//! replacing it, so a page that picked an explicit template is not
//! overridden by later default lookups.

use std::sync::{Arc, RwLock};

use big_storage::{TemplateFilter, TemplateRecord, TemplateSource};

use crate::error::TemplateError;
use crate::template::Template;

/// Label of the "use default template" entry in drop-down lists.
pub const DEFAULT_TEXT: &str = "- Use default template -";

pub struct TemplateManager {
    source: Arc<dyn TemplateSource>,
    default_text: String,
    active: RwLock<Arc<Template>>,
}

impl TemplateManager {
    #[must_use]
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self {
            source,
            default_text: DEFAULT_TEXT.to_owned(),
            active: RwLock::new(Arc::new(Template::empty())),
        }
    }

    /// Override the drop-down label for the default entry.
    #[must_use]
    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }

    /// The active template.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn active(&self) -> Arc<Template> {
        Arc::clone(&*self.active.read().unwrap())
    }

    /// Select the active template.
    ///
    /// A non-zero id loads that template. Zero resets to the empty template
    /// unless the active one is the default.
    pub fn set_active(&self, id: i64) -> Result<Arc<Template>, TemplateError> {
        if id != 0 {
            return self.load(id);
        }
        if !self.active().is_default {
            self.reset();
        }
        Ok(self.active())
    }

    /// Load template `id`, or the default template when `id` is 0.
    ///
    /// Returns the active template without querying when it already is
    /// `id`, or when `id` is 0 and a template is active.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] for an unknown id and
    /// [`TemplateError::NoDefault`] when no template is flagged as default.
    pub fn load(&self, id: i64) -> Result<Arc<Template>, TemplateError> {
        let active = self.active();
        if (id != 0 && active.id == id) || (id == 0 && !active.is_empty()) {
            return Ok(active);
        }

        let filter = if id == 0 {
            TemplateFilter::Default
        } else {
            TemplateFilter::Id(id)
        };
        match self.source.fetch(filter)? {
            Some(record) => self.configure(record),
            None if id == 0 => Err(TemplateError::NoDefault),
            None => Err(TemplateError::NotFound(id)),
        }
    }

    /// Decode `record` and make it the active template.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn configure(&self, record: TemplateRecord) -> Result<Arc<Template>, TemplateError> {
        let template = Arc::new(Template::try_from(record)?);
        *self.active.write().unwrap() = Arc::clone(&template);
        tracing::debug!(id = template.id, positions = template.positions.len(), "Activated template");
        Ok(template)
    }

    /// Make the empty template active.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn reset(&self) {
        *self.active.write().unwrap() = Arc::new(Template::empty());
    }

    /// Every stored template.
    pub fn templates(&self) -> Result<Vec<Template>, TemplateError> {
        self.source
            .fetch_all()?
            .into_iter()
            .map(Template::try_from)
            .collect()
    }

    /// `(id, title)` pairs for a select box.
    ///
    /// With `enable_default`, a leading entry with id 0 selects the default
    /// template.
    pub fn drop_down_list(&self, enable_default: bool) -> Result<Vec<(i64, String)>, TemplateError> {
        let mut options = Vec::new();
        if enable_default {
            options.push((0, self.default_text.clone()));
        }
        for record in self.source.fetch_all()? {
            options.push((record.id, record.title));
        }
        Ok(options)
    }

    /// Persist `record`. The storage keeps the default flag unique.
    ///
    /// Saving the active template refreshes it.
    pub fn save(&self, record: TemplateRecord) -> Result<Template, TemplateError> {
        let saved = self.source.save(record)?;
        if self.active().id == saved.id {
            return self.configure(saved).map(Arc::unwrap_or_clone);
        }
        Template::try_from(saved)
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::TemplateManager: Send, Sync);

    use big_storage::{MemoryStorage, Positions};
    use pretty_assertions::assert_eq;

    use super::*;

    fn positions(entries: &[(&str, &[i64])]) -> Positions {
        entries
            .iter()
            .map(|(name, ids)| ((*name).to_owned(), ids.to_vec()))
            .collect()
    }

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(
            MemoryStorage::new()
                .with_template(
                    TemplateRecord::new(1, "Main", positions(&[("sidebar", &[1, 2])])).as_default(),
                )
                .with_template(TemplateRecord::new(2, "Landing", positions(&[("hero", &[3])]))),
        )
    }

    fn manager(storage: &Arc<MemoryStorage>) -> TemplateManager {
        TemplateManager::new(Arc::clone(storage) as Arc<dyn TemplateSource>)
    }

    #[test]
    fn test_starts_empty() {
        let storage = storage();
        let templates = manager(&storage);

        assert!(templates.active().is_empty());
    }

    #[test]
    fn test_load_default() {
        let storage = storage();
        let templates = manager(&storage);

        let template = templates.load(0).unwrap();

        assert_eq!(template.id, 1);
        assert!(template.is_default);
        assert_eq!(templates.active().id, 1);
    }

    #[test]
    fn test_explicit_template_is_kept_for_default_lookups() {
        let storage = storage();
        let templates = manager(&storage);

        templates.load(2).unwrap();
        let again = templates.load(0).unwrap();

        assert_eq!(again.id, 2);
    }

    #[test]
    fn test_load_other_id_replaces_active() {
        let storage = storage();
        let templates = manager(&storage);

        templates.load(0).unwrap();
        let landing = templates.load(2).unwrap();

        assert_eq!(landing.title, "Landing");
        assert_eq!(templates.active().id, 2);
    }

    #[test]
    fn test_load_unknown_id() {
        let storage = storage();
        let templates = manager(&storage);

        assert!(matches!(templates.load(9), Err(TemplateError::NotFound(9))));
    }

    #[test]
    fn test_load_without_default() {
        let storage = Arc::new(MemoryStorage::new());
        let templates = manager(&storage);

        assert!(matches!(templates.load(0), Err(TemplateError::NoDefault)));
    }

    #[test]
    fn test_set_active_zero_keeps_default() {
        let storage = storage();
        let templates = manager(&storage);

        templates.set_active(1).unwrap();
        templates.set_active(0).unwrap();
        assert_eq!(templates.active().id, 1);

        templates.set_active(2).unwrap();
        templates.set_active(0).unwrap();
        assert!(templates.active().is_empty());
    }

    #[test]
    fn test_configure_decodes_encoded_positions() {
        let storage = storage();
        let templates = manager(&storage);
        let record: TemplateRecord =
            serde_json::from_str(r#"{"id": "7", "title": "Raw", "positions": "{\"top\":[4]}", "is_default": "0"}"#)
                .unwrap();

        let template = templates.configure(record).unwrap();

        assert_eq!(template.position("top"), &[4]);
        assert_eq!(templates.active().id, 7);
    }

    #[test]
    fn test_drop_down_list() {
        let storage = storage();
        let templates = manager(&storage).with_default_text("Default");

        assert_eq!(
            templates.drop_down_list(true).unwrap(),
            vec![
                (0, "Default".to_owned()),
                (1, "Main".to_owned()),
                (2, "Landing".to_owned()),
            ]
        );
        assert_eq!(templates.drop_down_list(false).unwrap().len(), 2);
    }

    #[test]
    fn test_save_new_default_demotes_previous() {
        let storage = storage();
        let templates = manager(&storage);

        let saved = templates
            .save(TemplateRecord::new(0, "Blog", Positions::new()).as_default())
            .unwrap();

        assert_eq!(saved.id, 3);
        let defaults: Vec<i64> = templates
            .templates()
            .unwrap()
            .into_iter()
            .filter(|t| t.is_default)
            .map(|t| t.id)
            .collect();
        assert_eq!(defaults, vec![3]);
    }

    #[test]
    fn test_save_active_refreshes_it() {
        let storage = storage();
        let templates = manager(&storage);
        templates.load(2).unwrap();

        templates
            .save(TemplateRecord::new(2, "Landing v2", positions(&[("hero", &[3, 4])])))
            .unwrap();

        assert_eq!(templates.active().title, "Landing v2");
        assert_eq!(templates.active().position("hero"), &[3, 4]);
    }
}
