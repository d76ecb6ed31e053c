use big_storage::{Positions, TemplateRecord};

use crate::error::TemplateError;

/// A decoded template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Template {
    /// 0 for the empty template.
    pub id: i64,
    pub title: String,
    pub positions: Positions,
    pub is_default: bool,
    pub layout: Option<String>,
}

impl Template {
    /// The template in effect before any is loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty template.
    pub fn is_empty(&self) -> bool {
        self.id == 0
    }

    /// Block ids assigned to `name`, empty when unassigned.
    pub fn position(&self, name: &str) -> &[i64] {
        self.positions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Assignments for the requested positions.
    ///
    /// Only positions with at least one block are returned. With no names,
    /// every assignment is returned.
    ///
    /// ```
    /// use big_template::Template;
    ///
    /// let mut template = Template::empty();
    /// template.positions.insert("a".to_owned(), vec![1, 2]);
    /// template.positions.insert("c".to_owned(), vec![3]);
    ///
    /// let found = template.get_positions(&["a", "b"]);
    /// assert!(found.contains_key("a"));
    /// assert_eq!(found.len(), 1);
    /// ```
    pub fn get_positions<S: AsRef<str>>(&self, names: &[S]) -> Positions {
        if names.is_empty() {
            return self.positions.clone();
        }

        let mut found = Positions::new();
        for name in names {
            let name = name.as_ref();
            let ids = self.position(name);
            if !ids.is_empty() {
                found.insert(name.to_owned(), ids.to_vec());
            }
        }
        found
    }
}

impl TryFrom<TemplateRecord> for Template {
    type Error = TemplateError;

    /// Decodes JSON-encoded positions. An empty string means no positions.
    fn try_from(record: TemplateRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        let positions = record
            .positions
            .decode()
            .map_err(|source| TemplateError::InvalidPositions { id, source })?;

        Ok(Self {
            id: record.id,
            title: record.title,
            positions,
            is_default: record.is_default,
            layout: record.layout,
        })
    }
}
