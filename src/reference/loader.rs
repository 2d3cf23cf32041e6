use std::path::Path;

use tracing::{debug, warn};

use super::ReferenceData;

/// Load the reference watchlists from a JSON file.
///
/// Never fails: an unreadable or malformed file yields four empty lists,
/// which makes every row score zero.
pub fn load_reference_data(path: &Path) -> ReferenceData {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Reference data unreadable, using empty lists");
            return ReferenceData::default();
        }
    };

    match serde_json::from_str::<ReferenceData>(&content) {
        Ok(data) => {
            debug!(path = %path.display(), entries = data.len(), "Reference data loaded");
            data
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Reference data malformed, using empty lists");
            ReferenceData::default()
        }
    }
}
