//! The normalization preset applied by the batch fixer.

use serde::{Deserialize, Serialize};

use super::types::FfmpegOptions;

/// Fixed conversion parameters: letterboxed scale to a target frame, H.264
/// video, AAC audio, progressive pixel layout, cleared rotation metadata and a
/// streaming-friendly container layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizePreset {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder speed preset (`-preset`).
    #[serde(default = "default_speed_preset")]
    pub speed_preset: String,

    /// Constant rate factor, 0-51.
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    #[serde(default = "default_max_muxing_queue_size")]
    pub max_muxing_queue_size: u32,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_speed_preset() -> String {
    "fast".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> u32 {
    128
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_max_muxing_queue_size() -> u32 {
    9999
}

impl Default for NormalizePreset {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            video_codec: default_video_codec(),
            speed_preset: default_speed_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate(),
            pixel_format: default_pixel_format(),
            max_muxing_queue_size: default_max_muxing_queue_size(),
        }
    }
}

impl NormalizePreset {
    /// Scale-and-pad filter that fits the input inside the target frame
    /// without distortion and centers it.
    pub fn video_filter(&self) -> String {
        let (w, h) = (self.width, self.height);
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
        )
    }

    /// Renders the preset as ffmpeg options.
    pub fn to_options(&self) -> FfmpegOptions {
        FfmpegOptions::new()
            .set("-vf", self.video_filter())
            .set("-c:v", &self.video_codec)
            .set("-preset", &self.speed_preset)
            .set("-crf", self.crf.to_string())
            .set("-c:a", &self.audio_codec)
            .set("-b:a", format!("{}k", self.audio_bitrate_kbps))
            .set("-pix_fmt", &self.pixel_format)
            .set("-metadata:s:v:0", "rotate=0")
            .set("-movflags", "+faststart")
            .set(
                "-max_muxing_queue_size",
                self.max_muxing_queue_size.to_string(),
            )
    }
}
