//! Bounded-concurrency playlist downloader built on yt-dlp.
//!
//! [`downloader::Downloader`] lists a playlist's tracks, then downloads them a few
//! at a time, trying a preferred audio format and falling back through
//! wav, opus and mp3 until one works. Partial failures are collected into a
//! [`types::BatchReport`] instead of aborting the batch.

pub mod attempt;
pub mod cli;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod observer;
pub mod parser;
pub mod report;
pub mod tool;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
