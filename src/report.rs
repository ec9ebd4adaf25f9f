use crate::error::DownloaderError;
use crate::types::BatchReport;
use std::path::Path;

enum Row<'a> {
    Downloaded { format: &'a str },
    Failed { error: &'a str },
}

/// Writes one CSV row per track, in playlist order.
pub fn write_report_csv(report: &BatchReport, path: &Path) -> Result<(), DownloaderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut rows: Vec<(usize, &str, Row)> = report
        .downloaded
        .iter()
        .map(|d| (d.item.index, d.item.url.as_str(), Row::Downloaded { format: &d.format }))
        .chain(report.failures.iter().map(|f| {
            (f.item.index, f.item.url.as_str(), Row::Failed { error: &f.diagnostic })
        }))
        .collect();
    rows.sort_by_key(|(index, _, _)| *index);

    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["Track", "URL", "Status", "Format", "Error"])?;

    for (index, url, row) in rows {
        let (status, format, error) = match row {
            Row::Downloaded { format } => ("Success", format, ""),
            Row::Failed { error } => ("Failed", "", error),
        };
        let track = (index + 1).to_string();
        wtr.write_record([track.as_str(), url, status, format, error])?;
    }

    wtr.flush()?;
    Ok(())
}
