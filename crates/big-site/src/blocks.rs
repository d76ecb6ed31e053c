//! Block fragments collected per position for one page.

use big_parser::BlocksByPosition;
use big_storage::{BlockSource, Positions, StorageError};

/// Rendered block fragments keyed by position.
///
/// Fragments come either from template assignments through
/// [`register_positions`](Self::register_positions) or directly through
/// [`add_block`](Self::add_block). Both append, so a position can mix them.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: BlocksByPosition,
}

impl BlockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `content` to `position`.
    pub fn add_block(&mut self, position: impl Into<String>, content: impl Into<String>) {
        self.blocks
            .entry(position.into())
            .or_default()
            .push(content.into());
    }

    /// Render every block assigned in `positions` and append it to its position.
    ///
    /// All ids are rendered in one provider call. Ids the provider does not
    /// return (missing or inactive blocks) are skipped. Assignment order is
    /// kept within each position.
    pub fn register_positions(
        &mut self,
        positions: &Positions,
        provider: &dyn BlockSource,
    ) -> Result<(), StorageError> {
        let mut ids: Vec<i64> = positions.values().flatten().copied().collect();
        if ids.is_empty() {
            return Ok(());
        }
        ids.sort_unstable();
        ids.dedup();

        let rendered = provider.render_blocks(&ids)?;
        for (position, block_ids) in positions {
            for id in block_ids {
                if let Some(html) = rendered.get(id) {
                    self.add_block(position.as_str(), html.as_str());
                }
            }
        }

        tracing::debug!(
            requested = ids.len(),
            rendered = rendered.len(),
            "Registered position blocks"
        );
        Ok(())
    }

    pub fn blocks(&self) -> &BlocksByPosition {
        &self.blocks
    }

    /// Fragments of one position, empty when none were added.
    pub fn position(&self, position: &str) -> &[String] {
        self.blocks.get(position).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn into_blocks(self) -> BlocksByPosition {
        self.blocks
    }
}
