//! Reference bundle builder: resolves selected paths to document text.

use scribe_types::reference::{is_markdown, ReferenceDoc, ReferenceSelection};
use crate::ports::DocumentReader;

/// Resolve every selected markdown path through `reader`, in selection order.
///
/// Paths that are not markdown documents, or that no longer resolve (deleted
/// since selection, or a folder), are left out without failing the bundle.
pub async fn build_bundle(
    selection: &ReferenceSelection,
    reader: &dyn DocumentReader,
) -> Vec<ReferenceDoc> {
    let mut bundle = Vec::with_capacity(selection.len());
    for path in selection.iter() {
        if !is_markdown(path) {
            log::debug!("Skipping non-markdown reference {}", path);
            continue;
        }
        match reader.read_document(path).await {
            Ok(content) => bundle.push(ReferenceDoc {
                name: path.to_string(),
                content,
            }),
            Err(e) => log::debug!("Skipping unreadable reference: {}", e),
        }
    }
    bundle
}
