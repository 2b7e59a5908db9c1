mod manuscript;
mod prisma;
mod structured;
mod zettlr;

pub use manuscript::ManuscriptEndpoint;
pub use prisma::PrismaEndpoint;
pub use structured::StructuredEndpoint;
pub use zettlr::ZettlrEndpoint;

use std::path::Path;

use anyhow::{Context, Result};

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write `contents` to `path`, creating parent directories.
pub(crate) fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
