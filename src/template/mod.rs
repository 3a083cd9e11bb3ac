//! Template parsing: turns the line-oriented demo file into the ordered
//! category/channel structure the rest of the pipeline keys on.

use std::path::Path;

use tracing::info;

use crate::errors::AppError;
use crate::models::{Template, GENRE_MARKER};

/// Read and parse the template file. An unreadable file is fatal to the
/// whole run, unlike source fetch failures.
pub fn load_template(path: &Path) -> Result<Template, AppError> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::Template {
        path: path.display().to_string(),
        source,
    })?;

    let template = parse_template(&content);
    info!(
        "Template loaded from {}: {} categories, {} channels",
        path.display(),
        template.categories().len(),
        template.channel_count()
    );
    Ok(template)
}

/// Parse template content. A line containing the genre marker opens a new
/// category named by the text before the first comma; a non-empty line
/// without a comma belongs to the open category as a channel name. Lines
/// before the first category line are ignored.
pub fn parse_template(content: &str) -> Template {
    let mut template = Template::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(GENRE_MARKER) {
            let category = line.split(',').next().unwrap_or("").trim();
            template.push_category(category.to_string());
        } else if !line.contains(',') {
            template.push_channel(line.to_string());
        }
    }

    template
}
