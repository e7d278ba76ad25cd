//! Media sources
//!
//! Owns the native media handle of the open media. Media can be opened by
//! URL, by local path, or from an in-memory archive that the native engine
//! reads through byte-stream callbacks.

use crate::native::{NativeEngine, NativeMedia, StreamCallbacks};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::io::{Read, Seek, SeekFrom};
use std::os::raw::{c_int, c_uchar, c_void};
use std::panic;
use std::path::Path;
use std::slice;
use std::sync::Arc;
use std::time::Duration;

/// Random-access byte source
pub trait Archive: Read + Seek + Send {}

impl<T: Read + Seek + Send> Archive for T {}

/// Archive shared with the native read thread
struct ArchiveReader {
    archive: Mutex<Box<dyn Archive>>,
    size: u64,
}

impl ArchiveReader {
    fn new(mut archive: Box<dyn Archive>) -> Result<Self> {
        let size = archive.seek(SeekFrom::End(0))?;
        archive.seek(SeekFrom::Start(0))?;
        Ok(Self {
            archive: Mutex::new(archive),
            size,
        })
    }

    /// Reads up to `buf.len()` bytes, clamped to what is left
    fn read(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut archive = self.archive.lock();
        let position = archive.stream_position()?;
        let remaining = self.size.saturating_sub(position);
        let len = (buf.len() as u64).min(remaining) as usize;
        if len == 0 {
            return Ok(0);
        }
        archive.read(&mut buf[..len])
    }

    fn seek(&self, offset: u64) -> bool {
        if offset >= self.size {
            return false;
        }
        self.archive.lock().seek(SeekFrom::Start(offset)).is_ok()
    }

    fn rewind(&self) {
        let _ = self.archive.lock().seek(SeekFrom::Start(0));
    }
}

/// Source of the currently open media
pub struct MediaSource {
    engine: Arc<dyn NativeEngine>,
    // declared before `reader`: the media must be released first
    media: Option<Box<dyn NativeMedia>>,
    reader: Option<Box<ArchiveReader>>,
    url: String,
}

impl MediaSource {
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self {
            engine,
            media: None,
            reader: None,
            url: String::new(),
        }
    }

    /// Opens a media by URL
    pub fn open_url(&mut self, url: &str) -> Result<&dyn NativeMedia> {
        self.close();
        let media = self.engine.media_from_location(url)?;
        self.url = url.to_string();
        Ok(&**self.media.insert(media))
    }

    /// Opens a local file by path; `url` is remembered as the media's URL
    pub fn open_path(&mut self, path: &Path, url: &str) -> Result<&dyn NativeMedia> {
        self.close();
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        let media = self.engine.media_from_path(path)?;
        self.url = url.to_string();
        Ok(&**self.media.insert(media))
    }

    /// Opens a media whose bytes are read from `archive`
    pub fn open_archive(&mut self, archive: Box<dyn Archive>, url: &str) -> Result<&dyn NativeMedia> {
        self.close();

        let reader = Box::new(ArchiveReader::new(archive)?);
        if reader.size == 0 {
            return Err(Error::InvalidUrl(url.to_string()));
        }

        let callbacks = StreamCallbacks {
            open: handle_media_open,
            read: handle_media_read,
            seek: Some(handle_media_seek),
            close: Some(handle_media_close),
            opaque: &*reader as *const ArchiveReader as *mut c_void,
        };
        let media = self.engine.media_from_callbacks(callbacks)?;

        self.reader = Some(reader);
        self.url = url.to_string();
        Ok(&**self.media.insert(media))
    }

    /// Releases the media, then the archive it reads from
    pub fn close(&mut self) {
        if self.media.take().is_some() {
            tracing::debug!(url = %self.url, "media released");
        }
        self.reader = None;
        self.url.clear();
    }

    pub fn media(&self) -> Option<&dyn NativeMedia> {
        self.media.as_deref()
    }

    /// Duration reported by the native media
    pub fn duration(&self) -> Option<Duration> {
        let millis = self.media.as_ref()?.duration_ms();
        u64::try_from(millis).ok().map(Duration::from_millis)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_archive(&self) -> bool {
        self.reader.is_some()
    }
}

impl Drop for MediaSource {
    fn drop(&mut self) {
        self.close();
    }
}

// ──────────────────── C-ABI trampolines ────────────────────

unsafe fn reader_from<'a>(opaque: *mut c_void) -> Option<&'a ArchiveReader> {
    unsafe { (opaque as *const ArchiveReader).as_ref() }
}

unsafe extern "C" fn handle_media_open(
    opaque: *mut c_void,
    datap: *mut *mut c_void,
    sizep: *mut u64,
) -> c_int {
    let result = panic::catch_unwind(|| {
        if datap.is_null() || sizep.is_null() {
            return -1;
        }
        let Some(reader) = (unsafe { reader_from(opaque) }) else {
            return -1;
        };

        reader.rewind();
        unsafe {
            *datap = opaque;
            *sizep = reader.size;
        }
        0
    });

    result.unwrap_or(-1)
}

unsafe extern "C" fn handle_media_read(opaque: *mut c_void, buf: *mut c_uchar, len: usize) -> isize {
    let result = panic::catch_unwind(|| {
        let Some(reader) = (unsafe { reader_from(opaque) }) else {
            return -1;
        };
        if len == 0 {
            return 0;
        }
        if buf.is_null() {
            return -1;
        }

        let buf = unsafe { slice::from_raw_parts_mut(buf, len) };
        match reader.read(buf) {
            Ok(read) => read as isize,
            Err(e) => {
                tracing::warn!("archive read failed: {e}");
                -1
            }
        }
    });

    result.unwrap_or(-1)
}

unsafe extern "C" fn handle_media_seek(opaque: *mut c_void, offset: u64) -> c_int {
    let result = panic::catch_unwind(|| match unsafe { reader_from(opaque) } {
        Some(reader) if reader.seek(offset) => 0,
        _ => -1,
    });

    result.unwrap_or(-1)
}

unsafe extern "C" fn handle_media_close(opaque: *mut c_void) {
    let _ = panic::catch_unwind(|| {
        if let Some(reader) = unsafe { reader_from(opaque) } {
            reader.rewind();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockEngine, MockSource};
    use std::io::Cursor;

    fn source() -> (Arc<MockEngine>, MediaSource) {
        let engine = MockEngine::new();
        let source = MediaSource::new(engine.clone());
        (engine, source)
    }

    #[test]
    fn test_open_url_keeps_media() {
        let (engine, mut source) = source();
        source.open_url("http://example.com/stream.m3u8").unwrap();

        assert_eq!(source.url(), "http://example.com/stream.m3u8");
        assert_eq!(source.duration(), Some(Duration::from_secs(90)));
        let media = engine.media().unwrap();
        assert!(matches!(&media.source, MockSource::Location(url) if url.ends_with(".m3u8")));
    }

    #[test]
    fn test_open_missing_path_fails() {
        let (engine, mut source) = source();
        let result = source.open_path(Path::new("/no/such/file.mp4"), "file:///no/such/file.mp4");

        assert!(result.is_err());
        assert!(source.media().is_none());
        assert!(engine.media().is_none());
    }

    #[test]
    fn test_archive_is_read_through_callbacks() {
        let (engine, mut source) = source();
        let bytes: Vec<u8> = (0..=255).cycle().take(1000).collect();
        source
            .open_archive(Box::new(Cursor::new(bytes.clone())), "file:///movie.mp4")
            .unwrap();

        let media = engine.media().unwrap();
        assert_eq!(media.read_stream(64).unwrap(), bytes);
        assert_eq!(media.read_stream(4096).unwrap(), bytes);
        assert!(source.is_archive());
    }

    #[test]
    fn test_archive_seek_past_end_fails() {
        let (engine, mut source) = source();
        source
            .open_archive(Box::new(Cursor::new(vec![0u8; 100])), "file:///a.wav")
            .unwrap();

        let media = engine.media().unwrap();
        assert_eq!(media.seek_stream(50), 0);
        assert_eq!(media.seek_stream(100), -1);
    }

    #[test]
    fn test_empty_archive_is_rejected() {
        let (_, mut source) = source();
        let result = source.open_archive(Box::new(Cursor::new(Vec::new())), "file:///empty");
        assert!(result.is_err());
        assert!(!source.is_archive());
    }

    #[test]
    fn test_close_releases_media() {
        let (engine, mut source) = source();
        source
            .open_archive(Box::new(Cursor::new(vec![1u8; 10])), "file:///x")
            .unwrap();
        assert!(engine.media().is_some());

        source.close();
        assert!(engine.media().is_none());
        assert!(source.url().is_empty());
        assert!(!source.is_archive());
    }
}
