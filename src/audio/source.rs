use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{Result, WingmanError};

/// Capacity of the frame channel between the capture callback and the
/// session's capture worker. The callback never blocks; frames beyond this
/// backlog are dropped and counted.
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Raw PCM delivered by a source, tagged with the stream's native format.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Interleaved 16-bit PCM samples.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Milliseconds since capture started.
    pub timestamp_ms: u64,
}

/// How to pick the input device when a session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Platform default input device.
    #[default]
    Default,
    /// First input device whose name contains this substring.
    Name(String),
    /// Input device at this enumeration index.
    Index(usize),
}

impl std::fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceSelector::Default => write!(f, "default"),
            DeviceSelector::Name(name) => write!(f, "{}", name),
            DeviceSelector::Index(idx) => write!(f, "#{}", idx),
        }
    }
}

/// List the names of all available audio input devices.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(|e| WingmanError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Audio capture source.
///
/// Implementations deliver raw PCM frames over a bounded channel:
/// `CpalSource` for real input devices, `ScriptedSource` for deterministic
/// frames in tests and headless runs.
#[async_trait::async_trait]
pub trait AudioSource: Send + Sync {
    /// Start capturing.
    ///
    /// Returns a channel receiver that will receive audio frames. The channel
    /// closes when the source stops or runs out of input.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing and release the device. Safe to call repeatedly, and
    /// safe to call after a failed `start`.
    async fn stop(&mut self) -> Result<()>;

    /// Whether the source is currently capturing.
    fn is_capturing(&self) -> bool;

    /// Frames discarded because the frame channel backed up.
    fn frames_dropped(&self) -> u64 {
        0
    }

    /// Source name for logging.
    fn name(&self) -> String;
}

// ============================================================================
// CpalSource
// ============================================================================

/// Real input-device capture via cpal.
///
/// The cpal `Stream` is `!Send`, so `start` hands it to a dedicated thread
/// that keeps it alive and polls the stop flag. The stream's data callback
/// packages native-format frames and `try_send`s them into the bounded frame
/// channel; a full channel drops the frame and bumps the drop counter rather
/// than blocking the audio thread.
pub struct CpalSource {
    selector: DeviceSelector,
    stop_flag: Arc<AtomicBool>,
    frames_dropped: Arc<AtomicU64>,
    thread: Option<std::thread::JoinHandle<()>>,
    capturing: bool,
}

impl CpalSource {
    pub fn new(selector: DeviceSelector) -> Self {
        Self {
            selector,
            stop_flag: Arc::new(AtomicBool::new(false)),
            frames_dropped: Arc::new(AtomicU64::new(0)),
            thread: None,
            capturing: false,
        }
    }

    fn resolve_device(selector: &DeviceSelector) -> Result<cpal::Device> {
        let host = cpal::default_host();

        match selector {
            DeviceSelector::Default => {
                host.default_input_device()
                    .ok_or_else(|| WingmanError::DeviceNotFound {
                        device: "default".to_string(),
                    })
            }
            DeviceSelector::Name(name) => {
                let devices = host.input_devices().map_err(|e| WingmanError::AudioCapture {
                    message: format!("Failed to enumerate input devices: {}", e),
                })?;
                for device in devices {
                    if let Ok(device_name) = device.name() {
                        if device_name.contains(name.as_str()) {
                            return Ok(device);
                        }
                    }
                }
                Err(WingmanError::DeviceNotFound {
                    device: name.clone(),
                })
            }
            DeviceSelector::Index(idx) => {
                let mut devices = host.input_devices().map_err(|e| WingmanError::AudioCapture {
                    message: format!("Failed to enumerate input devices: {}", e),
                })?;
                devices
                    .nth(*idx)
                    .ok_or_else(|| WingmanError::DeviceNotFound {
                        device: format!("#{}", idx),
                    })
            }
        }
    }

    /// Build the input stream and run it until the stop flag is set.
    /// Runs on the dedicated capture thread; reports startup outcome once
    /// through `ready_tx`.
    fn run_capture(
        selector: DeviceSelector,
        frame_tx: mpsc::Sender<AudioFrame>,
        stop_flag: Arc<AtomicBool>,
        frames_dropped: Arc<AtomicU64>,
        ready_tx: tokio::sync::oneshot::Sender<Result<()>>,
    ) {
        let device = match Self::resolve_device(&selector) {
            Ok(d) => d,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        let device_name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());

        let supported = match device.default_input_config() {
            Ok(c) => c,
            Err(e) => {
                let _ = ready_tx.send(Err(WingmanError::AudioCapture {
                    message: format!("No supported input config for {}: {}", device_name, e),
                }));
                return;
            }
        };

        let sample_rate = supported.sample_rate();
        let channels = supported.channels();
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();
        let started = Instant::now();

        // Overflow/underflow and other transient stream errors are logged and
        // skipped; they must never abort capture.
        let error_cb = move |err: cpal::StreamError| {
            warn!("Transient audio stream error (skipping): {}", err);
        };

        let stream = match sample_format {
            SampleFormat::I16 => {
                let tx = frame_tx.clone();
                let dropped = Arc::clone(&frames_dropped);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        deliver_frame(
                            data.to_vec(),
                            sample_rate,
                            channels,
                            started,
                            &tx,
                            &dropped,
                        );
                    },
                    error_cb,
                    None,
                )
            }
            SampleFormat::F32 => {
                let tx = frame_tx.clone();
                let dropped = Arc::clone(&frames_dropped);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let samples: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        deliver_frame(samples, sample_rate, channels, started, &tx, &dropped);
                    },
                    error_cb,
                    None,
                )
            }
            other => {
                let _ = ready_tx.send(Err(WingmanError::AudioCapture {
                    message: format!("Unsupported sample format {:?} (need I16 or F32)", other),
                }));
                return;
            }
        };

        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                let _ = ready_tx.send(Err(WingmanError::AudioCapture {
                    message: format!("Failed to build input stream: {}", e),
                }));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(WingmanError::AudioCapture {
                message: format!("Failed to start input stream: {}", e),
            }));
            return;
        }

        info!(
            "Capturing from {} ({} Hz, {} ch, {:?})",
            device_name, sample_rate, channels, sample_format
        );
        let _ = ready_tx.send(Ok(()));

        // Keep the stream alive until stop is requested or the consumer goes
        // away. Dropping the stream releases the device.
        while !stop_flag.load(Ordering::SeqCst) && !frame_tx.is_closed() {
            std::thread::sleep(Duration::from_millis(50));
        }

        drop(stream);
        info!("Capture stopped on {}", device_name);
    }
}

fn deliver_frame(
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
    started: Instant,
    tx: &mpsc::Sender<AudioFrame>,
    dropped: &AtomicU64,
) {
    let frame = AudioFrame {
        samples,
        sample_rate,
        channels,
        timestamp_ms: started.elapsed().as_millis() as u64,
    };

    match tx.try_send(frame) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            dropped.fetch_add(1, Ordering::Relaxed);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

#[async_trait::async_trait]
impl AudioSource for CpalSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

        self.stop_flag.store(false, Ordering::SeqCst);

        let selector = self.selector.clone();
        let stop_flag = Arc::clone(&self.stop_flag);
        let frames_dropped = Arc::clone(&self.frames_dropped);

        let thread = std::thread::Builder::new()
            .name("wingman-capture".to_string())
            .spawn(move || {
                Self::run_capture(selector, frame_tx, stop_flag, frames_dropped, ready_tx);
            })
            .map_err(|e| WingmanError::AudioCapture {
                message: format!("Failed to spawn capture thread: {}", e),
            })?;

        self.thread = Some(thread);

        match ready_rx.await {
            Ok(Ok(())) => {
                self.capturing = true;
                Ok(frame_rx)
            }
            Ok(Err(e)) => {
                // Startup failed inside the thread; reap it before returning.
                self.stop().await?;
                Err(e)
            }
            Err(_) => {
                self.stop().await?;
                Err(WingmanError::AudioCapture {
                    message: "Capture thread exited before reporting readiness".to_string(),
                })
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        self.stop_flag.store(true, Ordering::SeqCst);

        if let Some(handle) = self.thread.take() {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }

        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    fn name(&self) -> String {
        format!("cpal:{}", self.selector)
    }
}

// ============================================================================
// ScriptedSource
// ============================================================================

/// Deterministic source that plays back a fixed frame script.
///
/// Used by tests and by headless runs that feed prerecorded audio through the
/// pipeline. The frame channel closes once the script is exhausted, which the
/// session treats as end-of-input.
pub struct ScriptedSource {
    frames: Vec<AudioFrame>,
    interval: Option<Duration>,
    task: Option<tokio::task::JoinHandle<()>>,
    capturing: bool,
}

impl ScriptedSource {
    pub fn new(frames: Vec<AudioFrame>) -> Self {
        Self {
            frames,
            interval: None,
            task: None,
            capturing: false,
        }
    }

    /// Pace playback at one frame per `interval` instead of bursting.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Build a script of uniform frames: `count` frames of `frame_samples`
    /// zero samples each, stamped at `frame_ms` intervals.
    pub fn silence(count: usize, frame_samples: usize, sample_rate: u32, frame_ms: u64) -> Self {
        let frames = (0..count)
            .map(|i| AudioFrame {
                samples: vec![0i16; frame_samples],
                sample_rate,
                channels: 1,
                timestamp_ms: i as u64 * frame_ms,
            })
            .collect();
        Self::new(frames)
    }
}

#[async_trait::async_trait]
impl AudioSource for ScriptedSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let frames = std::mem::take(&mut self.frames);
        let interval = self.interval;

        let task = tokio::spawn(async move {
            for frame in frames {
                if let Some(d) = interval {
                    tokio::time::sleep(d).await;
                }
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        self.task = Some(task);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
