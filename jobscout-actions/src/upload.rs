use jobscout_common::ActionResult;
use jobscout_drivers::BrowserSession;
use std::path::Path;
use tracing::{debug, info};

/// Where an upload attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The file to upload is missing locally.
    MissingFile,
    /// The index resolves to no element.
    NoElement,
    /// Neither the element nor anything below it is a file input that can be
    /// found on the live page.
    NoUploadControl,
    Uploaded,
    /// Attaching the file failed; carries the underlying cause.
    Failed(String),
}

impl UploadOutcome {
    pub fn into_result(self, index: usize, path: &Path) -> ActionResult {
        match self {
            UploadOutcome::MissingFile => {
                ActionResult::error(format!("Upload file not found: {}", path.display()))
            }
            UploadOutcome::NoElement => {
                ActionResult::error(format!("No element found at index {index}"))
            }
            UploadOutcome::NoUploadControl => {
                ActionResult::error(format!("No file upload element found at index {index}"))
            }
            UploadOutcome::Uploaded => {
                ActionResult::content(format!("Successfully uploaded file to index {index}"))
            }
            UploadOutcome::Failed(cause) => {
                ActionResult::error(format!("Failed to upload file to index {index}: {cause}"))
            }
        }
    }
}

/// Attach `path` to the file input at (or below) the element at `index`.
pub async fn upload_file(session: &dyn BrowserSession, index: usize, path: &Path) -> UploadOutcome {
    if !path.is_file() {
        return UploadOutcome::MissingFile;
    }

    let node = match session.dom_element_by_index(index).await {
        Ok(Some(node)) => node,
        Ok(None) => return UploadOutcome::NoElement,
        Err(e) => return UploadOutcome::Failed(format!("element lookup failed: {e:#}")),
    };

    let Some(control) = node.file_upload_element() else {
        info!(target: "jobscout.upload", index, tag = %node.tag, "no file upload element found");
        return UploadOutcome::NoUploadControl;
    };

    let element = match session.locate_element(control).await {
        Ok(Some(element)) => element,
        Ok(None) => {
            info!(target: "jobscout.upload", index, xpath = %control.xpath, "file input is no longer attached");
            return UploadOutcome::NoUploadControl;
        }
        Err(e) => return UploadOutcome::Failed(format!("{e:#}")),
    };

    match session.set_input_files(&element, path).await {
        Ok(()) => {
            info!(target: "jobscout.upload", index, path = %path.display(), "uploaded file");
            UploadOutcome::Uploaded
        }
        Err(e) => {
            debug!(target: "jobscout.upload", index, error = %format!("{e:#}"), "set_input_files failed");
            UploadOutcome::Failed(format!("{e:#}"))
        }
    }
}
