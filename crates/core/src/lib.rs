//! Core library for the Beat Slideshow application.
//!
//! A slideshow pairs an image sequence with a sequence of text overlays and
//! paces both to a shared tempo. The [`timeline`] module holds the two phase
//! timers, [`session`] drives them from a frame loop, and [`render`] defines
//! the parameter sink a rendering backend implements. Nothing here touches
//! pixels or decodes files.

pub mod assets;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod timeline;

pub use assets::{AssetStore, ImageAsset, TextAsset};
pub use config::{AppConfig, AssetConfig, ImageTiming, PlaybackConfig, TextTiming};
pub use error::{Result, SlideshowError};
pub use render::{ImageParams, RenderGraph, RenderSink, TextParams, TextSlot};
pub use session::{Session, SessionSnapshot, SessionState, TickReport};
pub use timeline::{
    FrameClock, ImageEvents, ImagePhase, ImageSnapshot, ImageTimeline, Tempo, TextEvents,
    TextPhase, TextSnapshot, TextTimeline,
};
