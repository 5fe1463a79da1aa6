use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Text pulled out of the résumé, page by page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeText {
    pub text: String,
    /// Characters (not bytes) in `text`.
    pub chars: usize,
    pub pages: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    #[error("résumé not found at {0}")]
    NotFound(PathBuf),
    #[error("could not parse résumé {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
}

/// Concatenate the text of every page in page order.
///
/// A page with no text contributes nothing. A missing file, an unreadable
/// document or any page whose content cannot be extracted is an error; there
/// is no partial-document fallback.
pub fn read_document(path: &Path) -> Result<ResumeText, ResumeError> {
    if !path.is_file() {
        return Err(ResumeError::NotFound(path.to_path_buf()));
    }
    let parse_error = |source: lopdf::Error| ResumeError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let doc = Document::load(path).map_err(parse_error)?;

    let pages = doc.get_pages();
    let mut text = String::new();
    for (page_number, page_id) in &pages {
        let page_text = page_contents_resolve(&doc, *page_id)
            .and_then(|()| doc.extract_text(&[*page_number]))
            .map_err(|e| {
                debug!(target: "jobscout.resume", page = page_number, error = %e, "page text extraction failed");
                parse_error(e)
            })?;
        text.push_str(&page_text);
    }

    let chars = text.chars().count();
    info!(target: "jobscout.resume", path = %path.display(), pages = pages.len(), chars, "read cv");
    Ok(ResumeText {
        text,
        chars,
        pages: pages.len(),
    })
}

/// `extract_text` skips content references it cannot resolve, which would
/// hide a damaged page.
fn page_contents_resolve(doc: &Document, page_id: ObjectId) -> lopdf::Result<()> {
    for content_id in doc.get_page_contents(page_id) {
        doc.get_object(content_id).and_then(Object::as_stream)?;
    }
    Ok(())
}

/// [`read_document`] on the blocking pool.
pub async fn read_document_async(path: PathBuf) -> anyhow::Result<ResumeText> {
    Ok(tokio::task::spawn_blocking(move || read_document(&path)).await??)
}
