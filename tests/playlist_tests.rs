use walkman_viewer::video::hls::{parse_playlist, resolve_url, select_highest, Playlist, Variant};

// Shaped like the Cloudflare Stream manifests the player consumes.
const CLOUDFLARE_STYLE_MASTER: &str = "#EXTM3U\n\
#EXT-X-VERSION:6\n\
#EXT-X-INDEPENDENT-SEGMENTS\n\
#EXT-X-STREAM-INF:RESOLUTION=854x480,CODECS=\"avc1.4d401f,mp4a.40.2\",BANDWIDTH=1214544,FRAME-RATE=30.000\n\
stream_t1.m3u8?parent=manifest\n\
#EXT-X-STREAM-INF:RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\",BANDWIDTH=2578704,FRAME-RATE=30.000\n\
stream_t2.m3u8?parent=manifest\n\
#EXT-X-STREAM-INF:RESOLUTION=640x360,CODECS=\"avc1.42c01e,mp4a.40.2\",BANDWIDTH=651408,FRAME-RATE=30.000\n\
stream_t3.m3u8?parent=manifest\n";

const VOD_MEDIA: &str = "#EXTM3U\n\
#EXT-X-VERSION:6\n\
#EXT-X-TARGETDURATION:4\n\
#EXT-X-PLAYLIST-TYPE:VOD\n\
#EXTINF:4.000,\n\
seg_1.ts\n\
#EXTINF:4.000,\n\
seg_2.ts\n\
#EXTINF:4.000,\n\
seg_3.ts\n\
#EXTINF:1.760,\n\
seg_4.ts\n\
#EXT-X-ENDLIST\n";

#[cfg(test)]
mod rendition_selection_tests {
    use super::*;

    #[test]
    fn forces_the_highest_bandwidth_rendition() {
        let Playlist::Master(variants) = parse_playlist(CLOUDFLARE_STYLE_MASTER).unwrap() else {
            panic!("expected a master playlist");
        };

        let best = select_highest(&variants).unwrap();
        assert_eq!(best.bandwidth, 2578704);
        assert_eq!(best.resolution, Some((1280, 720)));
        assert_eq!(best.uri, "stream_t2.m3u8?parent=manifest");
    }

    #[test]
    fn selection_is_by_bandwidth_not_listing_order() {
        // The 720p rendition is listed second; order must not matter.
        let Playlist::Master(variants) = parse_playlist(CLOUDFLARE_STYLE_MASTER).unwrap() else {
            panic!("expected a master playlist");
        };
        assert_eq!(variants.len(), 3);
        assert!(variants[2].bandwidth < variants[1].bandwidth);
        assert_eq!(select_highest(&variants).unwrap().bandwidth, 2578704);
    }

    #[test]
    fn equal_bandwidth_picks_the_last_listed() {
        let variants = vec![
            Variant { bandwidth: 500, resolution: None, uri: "first".into() },
            Variant { bandwidth: 500, resolution: None, uri: "second".into() },
        ];
        assert_eq!(select_highest(&variants).unwrap().uri, "second");
    }
}

#[cfg(test)]
mod media_playlist_tests {
    use super::*;

    #[test]
    fn duration_is_the_segment_sum() {
        let Playlist::Media(media) = parse_playlist(VOD_MEDIA).unwrap() else {
            panic!("expected a media playlist");
        };
        assert!((media.duration_s - 13.76).abs() < 1e-9);
    }

    #[test]
    fn endlist_marks_vod() {
        let Playlist::Media(media) = parse_playlist(VOD_MEDIA).unwrap() else {
            panic!("expected a media playlist");
        };
        assert!(media.is_vod);

        let live = VOD_MEDIA.replace("#EXT-X-ENDLIST\n", "");
        let Playlist::Media(media) = parse_playlist(&live).unwrap() else {
            panic!("expected a media playlist");
        };
        assert!(!media.is_vod);
    }
}

#[cfg(test)]
mod url_resolution_tests {
    use super::*;

    #[test]
    fn variant_uris_resolve_against_the_manifest_url() {
        let base = "https://customer.example.cloudflarestream.com/abc123/manifest/video.m3u8";
        assert_eq!(
            resolve_url(base, "stream_t2.m3u8?parent=manifest"),
            "https://customer.example.cloudflarestream.com/abc123/manifest/stream_t2.m3u8?parent=manifest"
        );
    }

    #[test]
    fn absolute_uris_pass_through() {
        assert_eq!(
            resolve_url("https://a.example/x.m3u8", "https://b.example/y.m3u8"),
            "https://b.example/y.m3u8"
        );
    }
}
