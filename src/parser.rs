use crate::error::DownloaderError;
use log::debug;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistListing {
    // yt-dlp writes `null` for unavailable entries
    #[serde(default)]
    entries: Option<Vec<Option<PlaylistEntry>>>,
}

/// Extracts track URLs from `yt-dlp --flat-playlist -J` output, in listing order.
pub fn parse_playlist_json(json: &str) -> Result<Vec<String>, DownloaderError> {
    let listing: PlaylistListing = serde_json::from_str(json)?;

    let urls: Vec<String> = listing
        .entries
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.url)
        .filter(|url| !url.is_empty())
        .collect();

    debug!("Parsed {} track URLs from playlist listing", urls.len());
    Ok(urls)
}
