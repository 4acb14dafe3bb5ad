pub mod ffmpeg_frame_source;
pub mod sample_clock;
