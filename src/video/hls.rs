//! HLS playlist handling: fetch the manifest, pick the rendition,
//! report stream duration. The heavy lifting (segment download and
//! decode) is ffmpeg's job; this layer only decides *which* playlist
//! ffmpeg gets and what the progress bar divides by.

use anyhow::{bail, Context, Result};

/// A rendition advertised by a master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub bandwidth: u64,
    pub resolution: Option<(u32, u32)>,
    pub uri: String,
}

/// Parsed playlist: either a master listing variants or a media
/// playlist with segments.
#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
    Master(Vec<Variant>),
    Media(MediaPlaylist),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaPlaylist {
    /// Sum of segment durations, seconds.
    pub duration_s: f64,
    /// `#EXT-X-ENDLIST` present: a VOD playlist that can loop.
    pub is_vod: bool,
}

/// Everything the decoder needs about the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub media_url: String,
    pub duration_s: f64,
    pub is_vod: bool,
}

/// Fetch and resolve the manifest at `url`. A master playlist forces
/// the highest-bandwidth rendition; a media playlist is used directly.
pub fn probe_stream(url: &str) -> Result<StreamInfo> {
    let body = fetch_playlist(url)?;
    match parse_playlist(&body)? {
        Playlist::Media(media) => Ok(StreamInfo {
            media_url: url.to_string(),
            duration_s: media.duration_s,
            is_vod: media.is_vod,
        }),
        Playlist::Master(variants) => {
            let best = select_highest(&variants)
                .context("master playlist lists no variants")?;
            log::info!(
                "selected rendition: {} bps{}",
                best.bandwidth,
                best.resolution
                    .map(|(w, h)| format!(", {}x{}", w, h))
                    .unwrap_or_default()
            );
            let media_url = resolve_url(url, &best.uri);
            let media_body = fetch_playlist(&media_url)?;
            match parse_playlist(&media_body)? {
                Playlist::Media(media) => Ok(StreamInfo {
                    media_url,
                    duration_s: media.duration_s,
                    is_vod: media.is_vod,
                }),
                Playlist::Master(_) => bail!("variant playlist is itself a master playlist"),
            }
        }
    }
}

pub fn fetch_playlist(url: &str) -> Result<String> {
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("failed to fetch playlist {}", url))?;
    if !response.status().is_success() {
        bail!("playlist {} responded with status {}", url, response.status());
    }
    response.text().context("failed to read playlist body")
}

pub fn parse_playlist(text: &str) -> Result<Playlist> {
    let mut lines = text.lines().map(str::trim);
    match lines.next() {
        Some("#EXTM3U") => {}
        _ => bail!("not an M3U8 playlist (missing #EXTM3U)"),
    }

    let mut variants = Vec::new();
    let mut pending_variant: Option<Variant> = None;
    let mut duration_s = 0.0;
    let mut is_vod = false;
    let mut saw_segment = false;

    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some(attrs) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            pending_variant = Some(parse_stream_inf(attrs)?);
        } else if let Some(rest) = line.strip_prefix("#EXTINF:") {
            let seconds = rest
                .split(',')
                .next()
                .unwrap_or("")
                .trim()
                .parse::<f64>()
                .with_context(|| format!("bad #EXTINF duration: {}", rest))?;
            duration_s += seconds;
            saw_segment = true;
        } else if line == "#EXT-X-ENDLIST" {
            is_vod = true;
        } else if !line.starts_with('#') {
            // A bare URI line closes the preceding #EXT-X-STREAM-INF,
            // or names a segment in a media playlist.
            if let Some(mut variant) = pending_variant.take() {
                variant.uri = line.to_string();
                variants.push(variant);
            }
        }
    }

    if !variants.is_empty() {
        Ok(Playlist::Master(variants))
    } else if saw_segment || is_vod {
        Ok(Playlist::Media(MediaPlaylist { duration_s, is_vod }))
    } else {
        bail!("playlist has neither variants nor segments");
    }
}

/// Highest-bandwidth rendition; ties resolve to the last listed, which
/// matches picking the top of a bandwidth-ordered level list.
pub fn select_highest(variants: &[Variant]) -> Option<&Variant> {
    let mut best: Option<&Variant> = None;
    for variant in variants {
        if best.map_or(true, |b| variant.bandwidth >= b.bandwidth) {
            best = Some(variant);
        }
    }
    best
}

/// Resolve a possibly-relative playlist URI against the manifest URL.
pub fn resolve_url(base: &str, uri: &str) -> String {
    if uri.contains("://") {
        return uri.to_string();
    }
    match base.rfind('/') {
        Some(slash) => format!("{}/{}", &base[..slash], uri),
        None => uri.to_string(),
    }
}

/// Parse the attribute list of an #EXT-X-STREAM-INF tag. Commas inside
/// quoted values (CODECS) are not separators.
fn parse_stream_inf(attrs: &str) -> Result<Variant> {
    let mut bandwidth = None;
    let mut resolution = None;

    for attr in split_attributes(attrs) {
        let Some((key, value)) = attr.split_once('=') else {
            continue;
        };
        match key {
            "BANDWIDTH" => {
                bandwidth = Some(
                    value
                        .parse::<u64>()
                        .with_context(|| format!("bad BANDWIDTH: {}", value))?,
                );
            }
            "RESOLUTION" => {
                if let Some((w, h)) = value.split_once('x') {
                    if let (Ok(w), Ok(h)) = (w.parse(), h.parse()) {
                        resolution = Some((w, h));
                    }
                }
            }
            _ => {}
        }
    }

    Ok(Variant {
        bandwidth: bandwidth.context("#EXT-X-STREAM-INF without BANDWIDTH")?,
        resolution,
        uri: String::new(),
    })
}

fn split_attributes(attrs: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in attrs.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(attrs[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(attrs[start..].trim());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360,CODECS=\"avc1.64001f,mp4a.40.2\"\n\
360p/video.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2400000,RESOLUTION=1280x720,CODECS=\"avc1.64001f,mp4a.40.2\"\n\
720p/video.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
1080p/video.m3u8\n";

    const MEDIA: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:6\n\
#EXTINF:6.000,\n\
seg0.ts\n\
#EXTINF:6.000,\n\
seg1.ts\n\
#EXTINF:3.500,\n\
seg2.ts\n\
#EXT-X-ENDLIST\n";

    #[test]
    fn parses_master_variants() {
        let Playlist::Master(variants) = parse_playlist(MASTER).unwrap() else {
            panic!("expected master playlist");
        };
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].bandwidth, 800000);
        assert_eq!(variants[0].resolution, Some((640, 360)));
        assert_eq!(variants[2].uri, "1080p/video.m3u8");
    }

    #[test]
    fn quoted_codecs_do_not_split_attributes() {
        let Playlist::Master(variants) = parse_playlist(MASTER).unwrap() else {
            panic!("expected master playlist");
        };
        // The CODECS comma must not have clobbered RESOLUTION parsing.
        assert_eq!(variants[1].resolution, Some((1280, 720)));
    }

    #[test]
    fn parses_media_playlist_duration_and_endlist() {
        let Playlist::Media(media) = parse_playlist(MEDIA).unwrap() else {
            panic!("expected media playlist");
        };
        assert!((media.duration_s - 15.5).abs() < 1e-9);
        assert!(media.is_vod);
    }

    #[test]
    fn live_playlist_has_no_endlist() {
        let live = "#EXTM3U\n#EXTINF:6.0,\nseg100.ts\n";
        let Playlist::Media(media) = parse_playlist(live).unwrap() else {
            panic!("expected media playlist");
        };
        assert!(!media.is_vod);
    }

    #[test]
    fn highest_bandwidth_wins_ties_to_last() {
        let variants = vec![
            Variant { bandwidth: 100, resolution: None, uri: "a".into() },
            Variant { bandwidth: 300, resolution: None, uri: "b".into() },
            Variant { bandwidth: 300, resolution: None, uri: "c".into() },
        ];
        assert_eq!(select_highest(&variants).unwrap().uri, "c");
        assert!(select_highest(&[]).is_none());
    }

    #[test]
    fn resolves_relative_and_absolute_uris() {
        let base = "https://host.example/stream/manifest/video.m3u8";
        assert_eq!(
            resolve_url(base, "720p/video.m3u8"),
            "https://host.example/stream/manifest/720p/video.m3u8"
        );
        assert_eq!(
            resolve_url(base, "https://cdn.example/other.m3u8"),
            "https://cdn.example/other.m3u8"
        );
    }

    #[test]
    fn rejects_non_m3u8_input() {
        assert!(parse_playlist("<html></html>").is_err());
        assert!(parse_playlist("#EXTM3U\n#EXT-X-VERSION:3\n").is_err());
    }
}
