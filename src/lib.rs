#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

//! Turns a list of video page links into a radio-station-style directory of
//! directly playable streams.

pub mod batch;
pub mod config;
pub mod extractor;
pub mod heuristics;
pub mod station;
pub mod util;
pub mod ytdlp;
