//! Asynchronous image loading.
//!
//! [`ImageLoader::load`] hands the source to a named decoder thread and
//! returns an [`ImageLoad`] future. The future resolves exactly once; polling
//! it again afterwards yields [`LoadError::Consumed`]. There is no
//! cancellation: dropping the future lets the thread finish and discards the
//! result.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use std::thread;

use crate::constants::IMAGE_DECODER_THREAD_NAME;
use crate::error::LoadError;

/// Where to read an image from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Encoded bytes already in memory
    Bytes(Vec<u8>),
    /// File read on the decoder thread
    Path(PathBuf),
}

/// Dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: usize,
    pub height: usize,
}

/// A decoded image with 8-bit RGBA pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub info: ImageInfo,
    pub rgba: Vec<u8>,
}

pub struct ImageLoader;

impl ImageLoader {
    /// Start decoding `source` in the background.
    pub fn load(source: ImageSource) -> ImageLoad {
        let (result_tx, result_rx) = mpsc::channel();
        let waker: Arc<Mutex<Option<Waker>>> = Arc::new(Mutex::new(None));
        let thread_waker = Arc::clone(&waker);

        let spawned = thread::Builder::new()
            .name(IMAGE_DECODER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = decode(source);
                // The receiver is gone if the future was dropped
                let _ = result_tx.send(result);
                if let Ok(mut slot) = thread_waker.lock() {
                    if let Some(waker) = slot.take() {
                        waker.wake();
                    }
                }
            });

        let state = match spawned {
            Ok(_) => LoadState::Pending(result_rx),
            Err(e) => {
                log::error!("Failed to spawn image decoder: {}", e);
                LoadState::Failed(LoadError::Spawn(e.to_string()))
            }
        };
        ImageLoad { state, waker }
    }
}

fn decode(source: ImageSource) -> Result<LoadedImage, LoadError> {
    let bytes = match source {
        ImageSource::Bytes(bytes) => bytes,
        ImageSource::Path(path) => {
            log::debug!("Reading image {:?}", path);
            std::fs::read(&path).map_err(|e| LoadError::Io(format!("{}: {}", path.display(), e)))?
        }
    };

    let image = image::load_from_memory(&bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
    let rgba = image.to_rgba8();
    let info = ImageInfo {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
    };
    log::debug!("Decoded image: {}x{} ({} bytes)", info.width, info.height, bytes.len());
    Ok(LoadedImage {
        info,
        rgba: rgba.into_raw(),
    })
}

enum LoadState {
    Pending(Receiver<Result<LoadedImage, LoadError>>),
    Failed(LoadError),
    Done,
}

/// Single-shot future returned by [`ImageLoader::load`].
pub struct ImageLoad {
    state: LoadState,
    waker: Arc<Mutex<Option<Waker>>>,
}

impl Future for ImageLoad {
    type Output = Result<LoadedImage, LoadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match std::mem::replace(&mut this.state, LoadState::Done) {
            LoadState::Done => Poll::Ready(Err(LoadError::Consumed)),
            LoadState::Failed(e) => Poll::Ready(Err(e)),
            LoadState::Pending(rx) => {
                // Register before checking so a result sent in between still wakes us
                if let Ok(mut slot) = this.waker.lock() {
                    *slot = Some(cx.waker().clone());
                }
                match rx.try_recv() {
                    Ok(result) => Poll::Ready(result),
                    Err(TryRecvError::Disconnected) => Poll::Ready(Err(LoadError::Disconnected)),
                    Err(TryRecvError::Empty) => {
                        this.state = LoadState::Pending(rx);
                        Poll::Pending
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::task::Wake;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_load_png() {
        let loaded = pollster::block_on(ImageLoader::load(ImageSource::Bytes(png(3, 2)))).unwrap();
        assert_eq!(loaded.info, ImageInfo { width: 3, height: 2 });
        assert_eq!(loaded.rgba.len(), 3 * 2 * 4);
        assert_eq!(&loaded.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_and_io_errors() {
        let result = pollster::block_on(ImageLoader::load(ImageSource::Bytes(b"not an image".to_vec())));
        assert!(matches!(result, Err(LoadError::Decode(_))));

        let missing = PathBuf::from("/nonexistent/annotator/image.png");
        let result = pollster::block_on(ImageLoader::load(ImageSource::Path(missing)));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    struct Noop;

    impl Wake for Noop {
        fn wake(self: Arc<Self>) {}
    }

    #[test]
    fn test_poll_after_completion_is_consumed() {
        let mut load = Box::pin(ImageLoader::load(ImageSource::Bytes(png(1, 1))));
        let waker = Waker::from(Arc::new(Noop));
        let mut cx = Context::from_waker(&waker);
        let first = loop {
            if let Poll::Ready(result) = load.as_mut().poll(&mut cx) {
                break result;
            }
            thread::yield_now();
        };
        assert!(first.is_ok());
        assert!(matches!(load.as_mut().poll(&mut cx), Poll::Ready(Err(LoadError::Consumed))));
    }
}
