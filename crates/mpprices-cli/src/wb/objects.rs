use mpprices_core::AppConfig;
use mpprices_scraper::wb::{ContentObject, ObjectsQuery};

use crate::export::{timestamped_path, Cell, SheetWriter};

use super::{cabinets_with_tokens, content_client};

const HEADERS: [&str; 4] = ["subject_id", "subject_name", "parent_id", "parent_name"];

fn cells(object: &ContentObject) -> Vec<Cell> {
    vec![
        Cell::from(object.subject_id),
        Cell::from(object.subject_name.as_str()),
        Cell::from(object.parent_id),
        Cell::from(object.parent_name.as_str()),
    ]
}

/// Exports the content subject catalogue. The catalogue is the same for
/// every seller, so one cabinet's token is enough.
///
/// # Errors
///
/// Returns an error if no cabinet has a token, the first page fails, or the
/// workbook cannot be written.
pub(crate) async fn run_objects(
    config: &AppConfig,
    cabinet: Option<&str>,
    parent_id: Option<u64>,
    name: Option<String>,
) -> anyhow::Result<()> {
    let cabinets = cabinets_with_tokens(config, cabinet)?;
    let Some(cabinet) = cabinets.first() else {
        anyhow::bail!("no WB cabinet has an API token");
    };

    let query = ObjectsQuery {
        locale: None,
        parent_id,
        name,
    };
    let objects = content_client(config, cabinet)?
        .fetch_all_objects(&query)
        .await?;
    tracing::info!(cabinet = cabinet.key, objects = objects.len(), "wb objects fetched");

    let cells: Vec<Vec<Cell>> = objects.iter().map(cells).collect();
    let path = timestamped_path(&config.output_dir, "wb_objects", chrono::Local::now());
    SheetWriter::new("Objects", &HEADERS).write(&path, &cells)?;
    Ok(())
}
