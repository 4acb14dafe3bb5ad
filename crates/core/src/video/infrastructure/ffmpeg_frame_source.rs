use std::io::Cursor;
use std::path::{Path, PathBuf};

use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::constants::DEFAULT_MAX_FRAME_DIMENSION;
use crate::shared::frame::Frame;
use crate::shared::timestamp::frame_timestamp;
use crate::video::domain::frame_source::{FrameSource, FrameSourceError};
use crate::video::infrastructure::sample_clock::SampleClock;

/// Samples a video at a fixed rate via ffmpeg-next and JPEG-encodes each
/// sample in memory.
///
/// Frames larger than `max_dimension` on their longest side are downscaled
/// before encoding.
pub struct FfmpegFrameSource {
    max_dimension: Option<u32>,
}

impl FfmpegFrameSource {
    pub fn new(max_dimension: Option<u32>) -> Self {
        Self { max_dimension }
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_FRAME_DIMENSION))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn extract(&mut self, video: &Path, sampling_rate: f64) -> Result<Vec<Frame>, FrameSourceError> {
        if !(sampling_rate > 0.0 && sampling_rate.is_finite()) {
            return Err(FrameSourceError::InvalidSamplingRate(sampling_rate));
        }
        if !video.is_file() {
            return Err(FrameSourceError::NotFound(video.to_path_buf()));
        }

        let decode_err = |e: ffmpeg_next::Error| FrameSourceError::Decode {
            path: video.to_path_buf(),
            message: e.to_string(),
        };

        ffmpeg_next::init().map_err(decode_err)?;
        let mut ictx = ffmpeg_next::format::input(video).map_err(decode_err)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| FrameSourceError::Decode {
                path: video.to_path_buf(),
                message: "no video stream found".into(),
            })?;

        let stream_index = stream.index();
        let time_base = f64::from(stream.time_base());
        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(decode_err)?;
        let decoder = codec_ctx.decoder().video().map_err(decode_err)?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(decode_err)?;

        log::info!(
            "Extracting frames from {} ({width}x{height} at {fps:.2} fps, sampling {sampling_rate} fps)",
            video.display()
        );

        let mut sampler = SampledDecode {
            path: video.to_path_buf(),
            decoder,
            scaler,
            clock: SampleClock::new(sampling_rate),
            sampling_rate,
            time_base,
            fps,
            origin: None,
            decoded: 0,
            width,
            height,
            max_dimension: self.max_dimension,
            frames: Vec::new(),
        };

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            if sampler.decoder.send_packet(&packet).is_err() {
                continue;
            }
            sampler.drain()?;
        }

        let _ = sampler.decoder.send_eof();
        sampler.drain()?;

        log::info!(
            "Extracted {} frames from {} decoded",
            sampler.frames.len(),
            sampler.decoded
        );
        Ok(sampler.frames)
    }
}

/// Decoder state for one extraction pass.
struct SampledDecode {
    path: PathBuf,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    clock: SampleClock,
    sampling_rate: f64,
    time_base: f64,
    fps: f64,
    origin: Option<i64>,
    decoded: usize,
    width: u32,
    height: u32,
    max_dimension: Option<u32>,
    frames: Vec<Frame>,
}

impl SampledDecode {
    fn drain(&mut self) -> Result<(), FrameSourceError> {
        let mut decoded = Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let time = self.frame_time(&decoded);
            self.decoded += 1;

            let due = self.clock.samples_due(time);
            if due == 0 {
                continue;
            }

            let mut rgb_frame = Video::empty();
            self.scaler
                .run(&decoded, &mut rgb_frame)
                .map_err(|e| FrameSourceError::Decode {
                    path: self.path.clone(),
                    message: e.to_string(),
                })?;

            let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
            let image = encode_jpeg(pixels, self.width, self.height, self.max_dimension).map_err(
                |message| FrameSourceError::Encode {
                    index: self.frames.len() + 1,
                    message,
                },
            )?;

            for _ in 0..due {
                let index = self.frames.len() + 1;
                let timestamp = frame_timestamp(index, self.sampling_rate);
                self.frames.push(Frame::new(index, timestamp, image.clone()));
            }
        }
        Ok(())
    }

    /// Seconds since the first decoded frame. Falls back to the nominal frame
    /// rate when the decoder reports no timestamp.
    fn frame_time(&mut self, decoded: &Video) -> f64 {
        match decoded.timestamp().or_else(|| decoded.pts()) {
            Some(pts) => {
                let origin = *self.origin.get_or_insert(pts);
                (pts - origin) as f64 * self.time_base
            }
            None if self.fps > 0.0 => self.decoded as f64 / self.fps,
            None => self.decoded as f64,
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping per-row stride padding.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

fn encode_jpeg(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    max_dimension: Option<u32>,
) -> Result<Vec<u8>, String> {
    let img = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| "frame data does not match its dimensions".to_string())?;

    let img = match scaled_size(width, height, max_dimension) {
        Some((w, h)) => image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle),
        None => img,
    };

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .map_err(|e| e.to_string())?;
    Ok(bytes)
}

/// Target size when the longest side exceeds `max_dimension`, keeping aspect.
fn scaled_size(width: u32, height: u32, max_dimension: Option<u32>) -> Option<(u32, u32)> {
    let max = max_dimension?;
    let longest = width.max(height);
    if max == 0 || longest <= max {
        return None;
    }
    let scale = max as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    Some((w, h))
}
