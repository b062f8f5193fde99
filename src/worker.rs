// THEORY:
// The segmentation core is synchronous and owns its state exclusively. Real
// capture loops, though, are async producers. The `SegmentationWorker` bridges
// the two with an actor: a single blocking task owns the `ViBe` model and serves
// requests from a bounded channel, one at a time, replying over a oneshot.
//
// Key principles:
// 1.  **Single owner**: only the actor task touches the sample store, so the
//     sequential row-major scan (and its reproducibility) is preserved even when
//     many async callers submit frames.
// 2.  **Blocking work off the runtime**: a frame scan is pure CPU work, so the
//     actor lives on `spawn_blocking` instead of stalling an async executor thread.
// 3.  **Backpressure**: the request channel is bounded. A producer that outruns
//     the model waits instead of queueing frames without limit.
// 4.  **Self-contained results**: every reply carries the frame index, a copy of
//     the mask and the blobs, which is everything downstream consumers (display,
//     ground-truth evaluation) need without reaching back into the model.

use crate::config::VibeConfig;
use crate::core_modules::blob::Blob;
use crate::error::{Result, VibeError};
use crate::pipeline::ViBe;
use futures::{Stream, StreamExt};
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

const REQUEST_QUEUE_SIZE: usize = 8;

/// Everything produced for one processed frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// 1-based index of the frame within the stream.
    pub frame_index: u64,
    pub mask: GrayImage,
    pub blobs: Vec<Blob>,
}

enum WorkerMessage {
    Process {
        frame: DynamicImage,
        samples_path: Option<PathBuf>,
        compute_blobs: bool,
        reply: oneshot::Sender<Result<FrameResult>>,
    },
    Save {
        path: PathBuf,
        reply: oneshot::Sender<Result<()>>,
    },
    Shutdown,
}

/// Handle to a background task that owns a `ViBe` model.
pub struct SegmentationWorker {
    sender: mpsc::Sender<WorkerMessage>,
    task: JoinHandle<()>,
}

impl SegmentationWorker {
    /// Builds the model and starts its actor on the current tokio runtime.
    /// Fails with `NoRuntime` when called outside one.
    pub fn spawn(config: VibeConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| VibeError::NoRuntime)?;
        let mut vibe = ViBe::new(config)?;
        let (sender, mut receiver) = mpsc::channel::<WorkerMessage>(REQUEST_QUEUE_SIZE);

        let task = runtime.spawn_blocking(move || {
            while let Some(message) = receiver.blocking_recv() {
                match message {
                    WorkerMessage::Process {
                        frame,
                        samples_path,
                        compute_blobs,
                        reply,
                    } => {
                        let result =
                            match vibe.process(&frame, samples_path.as_deref(), compute_blobs) {
                                Ok(mask) => {
                                    let mask = mask.clone();
                                    Ok(FrameResult {
                                        frame_index: vibe.frame_index(),
                                        mask,
                                        blobs: vibe.blobs().to_vec(),
                                    })
                                }
                                Err(e) => Err(e),
                            };
                        let _ = reply.send(result);
                    }
                    WorkerMessage::Save { path, reply } => {
                        let _ = reply.send(vibe.save_samples(&path));
                    }
                    WorkerMessage::Shutdown => break,
                }
            }
            debug!("segmentation worker stopped");
        });

        Ok(Self { sender, task })
    }

    /// Segments one frame. Frames are handled strictly in submission order.
    pub async fn process(&self, frame: DynamicImage, compute_blobs: bool) -> Result<FrameResult> {
        self.process_with_samples(frame, None, compute_blobs).await
    }

    /// Like [`process`](Self::process), offering a sample file for initialization.
    pub async fn process_with_samples(
        &self,
        frame: DynamicImage,
        samples_path: Option<PathBuf>,
        compute_blobs: bool,
    ) -> Result<FrameResult> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(WorkerMessage::Process {
                frame,
                samples_path,
                compute_blobs,
                reply,
            })
            .await
            .map_err(|_| VibeError::WorkerClosed)?;
        response.await.map_err(|_| VibeError::WorkerClosed)?
    }

    /// Persists the worker's sample store.
    pub async fn save_samples(&self, path: impl Into<PathBuf>) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(WorkerMessage::Save {
                path: path.into(),
                reply,
            })
            .await
            .map_err(|_| VibeError::WorkerClosed)?;
        response.await.map_err(|_| VibeError::WorkerClosed)?
    }

    /// Runs every frame of `frames` through the worker, in order.
    pub fn segment_stream<'a, S>(
        &'a self,
        frames: S,
        compute_blobs: bool,
    ) -> impl Stream<Item = Result<FrameResult>> + 'a
    where
        S: Stream<Item = DynamicImage> + 'a,
    {
        frames.then(move |frame| self.process(frame, compute_blobs))
    }

    /// Stops the actor after it finishes any queued requests.
    pub async fn shutdown(self) -> Result<()> {
        self.sender
            .send(WorkerMessage::Shutdown)
            .await
            .map_err(|_| VibeError::WorkerClosed)?;
        self.task.await.map_err(|_| VibeError::WorkerClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::{COLOR_BACKGROUND, COLOR_FOREGROUND};
    use futures::stream;
    use image::Luma;
    use tempfile::TempDir;

    fn gray(value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 12, Luma([value])))
    }

    fn config() -> VibeConfig {
        VibeConfig { seed: Some(21), ..Default::default() }
    }

    #[test]
    fn spawning_outside_a_runtime_is_an_error() {
        assert!(matches!(
            SegmentationWorker::spawn(config()),
            Err(VibeError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn frames_are_numbered_and_segmented() {
        let worker = SegmentationWorker::spawn(config()).expect("spawn");
        let first = worker.process(gray(80), true).await.expect("init");
        assert_eq!(first.frame_index, 1);
        assert!(first.mask.pixels().all(|p| p.0[0] == COLOR_BACKGROUND));

        let second = worker.process(gray(250), true).await.expect("frame");
        assert_eq!(second.frame_index, 2);
        assert!(second.mask.pixels().all(|p| p.0[0] == COLOR_FOREGROUND));
        assert_eq!(second.blobs.len(), 1);

        worker.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn errors_are_returned_to_the_caller() {
        let worker = SegmentationWorker::spawn(config()).expect("spawn");
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(
            worker.process(empty, false).await,
            Err(VibeError::InvalidFrame { .. })
        ));
        assert!(matches!(
            worker.save_samples("unused.bin").await,
            Err(VibeError::NotInitialized)
        ));
        worker.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn stream_preserves_order() {
        let worker = SegmentationWorker::spawn(config()).expect("spawn");
        let frames = stream::iter(vec![gray(10), gray(10), gray(10), gray(10)]);
        let results: Vec<_> = worker.segment_stream(frames, false).collect().await;
        let indices: Vec<u64> = results
            .into_iter()
            .map(|r| r.expect("frame").frame_index)
            .collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        worker.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn saved_samples_seed_a_new_worker() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("samples.bin");

        let trained = SegmentationWorker::spawn(config()).expect("spawn");
        trained.process(gray(60), false).await.expect("init");
        trained.save_samples(&path).await.expect("save");
        trained.shutdown().await.expect("shutdown");

        let fresh = SegmentationWorker::spawn(config()).expect("spawn");
        // The initialization frame is ignored because the file loads.
        fresh
            .process_with_samples(gray(200), Some(path.clone()), false)
            .await
            .expect("load");
        let result = fresh.process(gray(60), false).await.expect("frame");
        assert!(result.mask.pixels().all(|p| p.0[0] == COLOR_BACKGROUND));
        fresh.shutdown().await.expect("shutdown");
    }
}
