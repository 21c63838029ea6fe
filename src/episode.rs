//! Playlist decoding.
//!
//! Catalogs encode a playlist as `label$url` segments joined by `#`.

use serde::{Deserialize, Serialize};

/// One playable entry of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub label: String,
    pub url: String,
    /// Zero-based position of the segment in the encoded playlist.
    pub index: usize,
}

fn default_label(index: usize) -> String {
    format!("第{}集", index + 1)
}

/// Parses a normal-protocol playlist.
///
/// Segments without a URL are dropped. An empty label is replaced with a
/// numbered one and backslashes are stripped from URLs.
pub fn parse_play_url(play_url: &str) -> Vec<Episode> {
    if play_url.is_empty() {
        return Vec::new();
    }

    play_url
        .split('#')
        .enumerate()
        .filter_map(|(index, part)| {
            let mut pieces = part.split('$');
            let label = pieces.next().unwrap_or_default();
            let url = pieces.next().filter(|url| !url.is_empty())?;
            Some(Episode {
                label: if label.is_empty() {
                    default_label(index)
                } else {
                    label.to_string()
                },
                url: url.replace('\\', ""),
                index,
            })
        })
        .collect()
}

/// Parses a TVBox playlist.
///
/// A segment without `$` is a bare play id and is kept whole as the URL.
pub fn parse_tvbox_play_url(play_url: &str) -> Vec<Episode> {
    if play_url.is_empty() {
        return Vec::new();
    }

    play_url
        .split('#')
        .enumerate()
        .filter_map(|(index, part)| {
            let (label, url) = match part.split_once('$') {
                Some((label, rest)) => {
                    let url = rest.split('$').next().unwrap_or_default();
                    (label.to_string(), url)
                }
                None => (default_label(index), part),
            };
            (!url.is_empty()).then(|| Episode {
                label,
                url: url.to_string(),
                index,
            })
        })
        .collect()
}

/// The episode before the one with `current` as its index.
pub fn previous_episode(episodes: &[Episode], current: usize) -> Option<&Episode> {
    let position = episodes.iter().position(|e| e.index == current)?;
    position.checked_sub(1).and_then(|p| episodes.get(p))
}

/// The episode after the one with `current` as its index.
pub fn next_episode(episodes: &[Episode], current: usize) -> Option<&Episode> {
    let position = episodes.iter().position(|e| e.index == current)?;
    episodes.get(position + 1)
}
