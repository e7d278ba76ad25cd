//! Engine instance
//!
//! Created once at startup and shared by every player; must outlive them.

use crate::native::NativeEngine;
use crate::player::VlcMediaPlayer;
use crate::settings::VlcMediaSettings;
use std::sync::Arc;

pub struct EngineInstance {
    engine: Arc<dyn NativeEngine>,
    settings: VlcMediaSettings,
}

impl EngineInstance {
    /// Wraps an already initialized native engine
    pub fn with_engine(engine: Arc<dyn NativeEngine>, settings: VlcMediaSettings) -> Self {
        tracing::info!(version = %engine.version(), "media engine ready");
        Self { engine, settings }
    }

    /// Starts LibVLC with the startup arguments derived from `settings`
    #[cfg(feature = "libvlc")]
    pub fn start(settings: VlcMediaSettings) -> crate::Result<Self> {
        let engine = crate::libvlc::LibVlcEngine::new(&settings.engine_args())?;
        Ok(Self::with_engine(Arc::new(engine), settings))
    }

    pub fn create_player(&self) -> VlcMediaPlayer {
        VlcMediaPlayer::new(Arc::clone(&self.engine), &self.settings)
    }

    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.engine
    }

    pub fn settings(&self) -> &VlcMediaSettings {
        &self.settings
    }
}
