use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::{
    background::descriptor::BackgroundRequest,
    config::EffectConfig,
    foundation::{
        core::VideoFrame,
        error::{MatteError, MatteResult},
    },
    pipeline::MattePipeline,
    segmentation::SegmentationMasks,
};

enum Command {
    Render {
        frame: VideoFrame,
        masks: Option<SegmentationMasks>,
    },
    UpdateConfig(EffectConfig),
    RequestBackground(BackgroundRequest),
    Close,
}

/// Runs a [`MattePipeline`] on its own thread.
///
/// Frames are rendered one at a time in submission order and results come back in the same
/// order, so the ping-pong history is never raced. Submitting does not wait for the result.
pub struct PipelineWorker {
    commands: Sender<Command>,
    results: Receiver<MatteResult<VideoFrame>>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl PipelineWorker {
    pub fn spawn(pipeline: MattePipeline) -> MatteResult<Self> {
        let (commands, command_rx) = crossbeam_channel::unbounded();
        let (result_tx, results) = crossbeam_channel::unbounded();
        let handle = std::thread::Builder::new()
            .name("segmatte-pipeline".to_string())
            .spawn(move || run(pipeline, command_rx, result_tx))
            .map_err(|e| MatteError::resource(format!("failed to spawn pipeline worker: {e}")))?;
        Ok(Self {
            commands,
            results,
            handle: Some(handle),
            in_flight: 0,
        })
    }

    pub fn submit(
        &mut self,
        frame: VideoFrame,
        masks: Option<SegmentationMasks>,
    ) -> MatteResult<()> {
        self.send(Command::Render { frame, masks })?;
        self.in_flight += 1;
        Ok(())
    }

    /// Next result, blocking until the oldest submitted frame is done.
    pub fn recv(&mut self) -> MatteResult<VideoFrame> {
        if self.in_flight == 0 {
            return Err(MatteError::input("no frame in flight"));
        }
        let out = self
            .results
            .recv()
            .map_err(|_| MatteError::resource("pipeline worker stopped"))?;
        self.in_flight -= 1;
        out
    }

    pub fn render(
        &mut self,
        frame: VideoFrame,
        masks: Option<SegmentationMasks>,
    ) -> MatteResult<VideoFrame> {
        self.submit(frame, masks)?;
        self.recv()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Validated here; applies from the next frame the worker picks up.
    pub fn update_config(&self, config: EffectConfig) -> MatteResult<()> {
        config.validate()?;
        self.send(Command::UpdateConfig(config))
    }

    pub fn request_background(&self, request: BackgroundRequest) -> MatteResult<()> {
        self.send(Command::RequestBackground(request))
    }

    /// Stop after the frames already submitted and wait for the thread. Pending results are
    /// discarded.
    pub fn close(mut self) -> MatteResult<()> {
        self.shutdown()
    }

    fn send(&self, cmd: Command) -> MatteResult<()> {
        self.commands
            .send(cmd)
            .map_err(|_| MatteError::resource("pipeline worker stopped"))
    }

    fn shutdown(&mut self) -> MatteResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let _ = self.commands.send(Command::Close);
        handle
            .join()
            .map_err(|_| MatteError::resource("pipeline worker panicked"))
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn run(
    mut pipeline: MattePipeline,
    commands: Receiver<Command>,
    results: Sender<MatteResult<VideoFrame>>,
) {
    for cmd in commands.iter() {
        match cmd {
            Command::Render { frame, masks } => {
                let out = pipeline.render(frame, masks.as_ref());
                if results.send(out).is_err() {
                    break;
                }
            }
            Command::UpdateConfig(config) => {
                if let Err(e) = pipeline.update_config(config) {
                    tracing::warn!("config update rejected: {e}");
                }
            }
            Command::RequestBackground(request) => {
                if let Err(e) = pipeline.request_background(request) {
                    tracing::warn!("background request failed: {e}");
                }
            }
            Command::Close => break,
        }
    }
    pipeline.close();
}
