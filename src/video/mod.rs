pub mod hls;
pub mod texture;

pub use texture::VideoTexture;

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;

use anyhow::anyhow;
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use thiserror::Error;

use hls::StreamInfo;

/// Fixed manifest URL the player is bound to.
pub const DEFAULT_STREAM_URL: &str =
    "https://customer-2qqx87orhla11tfu.cloudflarestream.com/aed3641ac7d831d9b845bede45881698/manifest/video.m3u8";

/// Frames are decoded to a fixed 16:9 size and constant rate; playback
/// time is derived from the frame count.
pub const FRAME_WIDTH: u32 = 1280;
pub const FRAME_HEIGHT: u32 = 720;
pub const FRAME_RATE: f64 = 30.0;

/// Buffered frames required before playback may start on its own —
/// two seconds at the decode rate, the "can play through" point.
pub const READY_FRAME_COUNT: u64 = 60;

/// Channel capacity; the decoder blocks when the consumer falls this
/// far behind.
const FRAME_QUEUE: usize = 90;

/// One decoded RGBA frame.
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: i64,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("HLS playback is not supported on this system (no ffmpeg decoder found)")]
    Unsupported,
    #[error("failed to resolve stream {url:?}")]
    Manifest {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

/// The video element equivalent: a loop-enabled stream bound to one
/// manifest URL, with playback state readable every frame and mutated
/// only by explicit play/unmute commands.
pub struct VideoSource {
    rx: Receiver<VideoFrame>,
    latest: Option<VideoFrame>,
    duration_s: f64,
    playing: bool,
    muted: bool,
    volume: f32,
    frames_buffered: u64,
    frames_played: u64,
}

impl VideoSource {
    /// Resolve the manifest and start the decode pipeline.
    ///
    /// Mirrors the platform checks of the source selection chain: no
    /// usable decoder means the stream is unusable and playback simply
    /// never starts; a master manifest forces the highest rendition; a
    /// media manifest is fed to the decoder directly.
    pub fn open(url: &str) -> Result<Self, StreamError> {
        if !ffmpeg_available() {
            return Err(StreamError::Unsupported);
        }

        let info = hls::probe_stream(url).map_err(|source| StreamError::Manifest {
            url: url.to_string(),
            source,
        })?;
        log::info!(
            "stream resolved: {} ({}s, vod: {})",
            info.media_url,
            info.duration_s,
            info.is_vod
        );

        let rx = spawn_stream_reader(info.clone());

        Ok(Self {
            rx,
            latest: None,
            duration_s: info.duration_s,
            playing: false,
            muted: false,
            volume: 1.0,
            frames_buffered: 0,
            frames_played: 0,
        })
    }

    /// Drain newly decoded frames. While paused only the first frame is
    /// kept (the poster image); while playing the newest frame wins and
    /// playback time advances by the frames consumed.
    pub fn poll(&mut self) {
        let mut drained = 0u64;
        let mut newest: Option<VideoFrame> = None;
        while let Ok(frame) = self.rx.try_recv() {
            drained += 1;
            newest = Some(frame);
        }
        self.frames_buffered += drained;

        if let Some(frame) = newest {
            if self.playing {
                self.frames_played += drained;
                self.latest = Some(frame);
            } else if self.latest.is_none() {
                self.latest = Some(frame);
            }
        }
    }

    /// Newest frame to upload, if any arrived since the last call.
    pub fn latest_frame(&self) -> Option<&VideoFrame> {
        self.latest.as_ref()
    }

    /// Enough buffered to start without stalling.
    pub fn ready_to_play(&self) -> bool {
        self.frames_buffered >= READY_FRAME_COUNT
    }

    pub fn play(&mut self) {
        if !self.playing {
            log::info!("video playback started");
            self.playing = true;
        }
    }

    pub fn unmute(&mut self) {
        if self.muted {
            log::info!("video unmuted");
            self.muted = false;
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn paused(&self) -> bool {
        !self.playing
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// The stream loops, so it never reports ended.
    pub fn ended(&self) -> bool {
        false
    }

    /// Seconds of playback, wrapped at the stream duration to match a
    /// looping video element.
    pub fn current_time(&self) -> f64 {
        let raw = self.frames_played as f64 / FRAME_RATE;
        if self.duration_s > 0.0 {
            raw % self.duration_s
        } else {
            raw
        }
    }

    /// Total stream duration in seconds; 0 when unknown (live).
    pub fn duration(&self) -> f64 {
        self.duration_s
    }
}

/// `open` off the main thread: the decoder probe and manifest fetch
/// block, so they run on their own thread and the result arrives over
/// a channel the caller polls.
pub fn open_async(url: String) -> Receiver<Result<VideoSource, StreamError>> {
    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name("hls-open".into())
        .spawn(move || {
            let _ = tx.send(VideoSource::open(&url));
        })
        .expect("failed to spawn stream open thread");
    rx
}

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Background reader: spawns the decoder, forwards frames, and — for
/// VOD streams — respawns it on clean EOF so the stream loops.
fn spawn_stream_reader(info: StreamInfo) -> Receiver<VideoFrame> {
    let (tx, rx) = bounded(FRAME_QUEUE);

    thread::Builder::new()
        .name("hls-stream-reader".into())
        .spawn(move || loop {
            match run_decoder(&info.media_url, &tx) {
                Ok(()) if info.is_vod => {
                    log::debug!("stream reached end of playlist, looping");
                }
                Ok(()) => {
                    log::info!("live stream ended");
                    break;
                }
                Err(err) => {
                    log::warn!("stream decode failed: {err:#}");
                    break;
                }
            }
        })
        .expect("failed to spawn stream reader thread");

    rx
}

/// One decoder pass over the media playlist. Returns Ok on clean EOF.
fn run_decoder(media_url: &str, tx: &Sender<VideoFrame>) -> anyhow::Result<()> {
    let mut child = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(media_url)
        .arg("-vf")
        .arg(format!("scale={}:{}", FRAME_WIDTH, FRAME_HEIGHT))
        .arg("-r")
        .arg(format!("{}", FRAME_RATE))
        .arg("-pix_fmt")
        .arg("rgba")
        .arg("-f")
        .arg("rawvideo")
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("failed to capture decoder stdout"))?;

    let result = decode_loop(&mut stdout, tx);
    let _ = child.kill();
    let _ = child.wait();
    result
}

fn decode_loop(stdout: &mut impl Read, tx: &Sender<VideoFrame>) -> anyhow::Result<()> {
    let frame_bytes = (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize;
    let mut buffer = vec![0u8; frame_bytes];

    loop {
        match stdout.read_exact(&mut buffer) {
            Ok(()) => {
                let frame = VideoFrame {
                    data: buffer.clone(),
                    width: FRAME_WIDTH,
                    height: FRAME_HEIGHT,
                    timestamp_ms: Utc::now().timestamp_millis(),
                };
                if tx.send(frame).is_err() {
                    // Consumer gone; stop decoding.
                    return Ok(());
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }
}
