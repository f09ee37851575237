use super::config::SessionConfig;
use super::stats::{PipelineCounters, SessionStats};
use crate::audio::{
    encode_wav, normalize_frame, write_wav_file, AudioChunk, AudioSource, ChunkBuffer,
};
use crate::error::Result;
use crate::provider::TranscriptionProvider;
use crate::transcript::{TranscriptSegment, TranscriptStore};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Chunk hand-off queue between capture and transcription. Small on purpose:
/// when transcription falls this far behind, the capture worker blocks here
/// and the frame channel absorbs the burst instead.
const CHUNK_QUEUE_CAPACITY: usize = 8;

/// Transcript lines queued for the file writer.
const LINE_QUEUE_CAPACITY: usize = 64;

/// How long the capture worker waits for a frame before re-checking the stop
/// flag. Bounds shutdown latency when the device goes quiet.
const FRAME_RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// A recording session: one capture source feeding the chunked transcription
/// pipeline.
///
/// Three workers run per session — capture (frames to chunks), transcription
/// (chunks to transcript segments), persistence (segments to the transcript
/// file) — plus an optional timer that enforces a maximum duration. Workers
/// hand off over bounded channels and wind down by channel closure, so every
/// chunk already queued at stop time still gets transcribed.
pub struct RecordingSession {
    /// Session configuration
    config: SessionConfig,

    /// Shared transcript store the transcription worker appends into
    transcripts: Arc<TranscriptStore>,

    /// When the session started
    started_at: DateTime<Utc>,

    /// When the session finished winding down
    stopped_at: Mutex<Option<DateTime<Utc>>>,

    /// Cooperative cancellation flag for the pipeline workers
    stop_flag: Arc<AtomicBool>,

    /// Guards the finisher so it is spawned exactly once
    finish_started: AtomicBool,

    /// Pipeline counters (transcribed, failed, dropped)
    counters: Arc<PipelineCounters>,

    /// Every normalized sample captured, for WAV export on stop
    all_audio: Arc<Mutex<Vec<i16>>>,

    /// Handle for the capture worker
    capture_task: Mutex<Option<JoinHandle<()>>>,

    /// Handle for the transcription worker
    transcribe_task: Mutex<Option<JoinHandle<()>>>,

    /// Handle for the transcript file writer
    persist_task: Mutex<Option<JoinHandle<()>>>,

    /// Handle for the max-duration timer, if configured
    timer_task: Mutex<Option<JoinHandle<()>>>,

    /// Handle for the detached finisher spawned by `stop`
    finish_task: Mutex<Option<JoinHandle<()>>>,
}

impl RecordingSession {
    /// Start capturing and return the running session.
    ///
    /// Fails fast (device not found, capture setup) before any worker is
    /// spawned; once this returns `Ok`, errors are contained per-chunk inside
    /// the pipeline and never tear the session down.
    pub async fn start(
        config: SessionConfig,
        mut source: Box<dyn AudioSource>,
        transcriber: Arc<dyn TranscriptionProvider>,
        transcripts: Arc<TranscriptStore>,
    ) -> Result<Arc<Self>> {
        info!(
            "Starting recording session: {} (device: {})",
            config.session_id,
            source.name()
        );

        let frame_rx = source.start().await?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(PipelineCounters::new());
        let all_audio = Arc::new(Mutex::new(Vec::new()));

        let (chunk_tx, chunk_rx) = mpsc::channel::<AudioChunk>(CHUNK_QUEUE_CAPACITY);
        let (line_tx, line_rx) = mpsc::channel::<String>(LINE_QUEUE_CAPACITY);

        // Capture worker: frames in, fixed-duration chunks out.
        let capture_task = {
            let stop_flag = Arc::clone(&stop_flag);
            let counters = Arc::clone(&counters);
            let all_audio = Arc::clone(&all_audio);
            let sample_rate = config.sample_rate;
            let channels = config.channels;
            let chunk_seconds = config.chunk_seconds;
            let mut frame_rx = frame_rx;

            tokio::spawn(async move {
                info!("Capture worker started");

                let mut chunker = ChunkBuffer::new(chunk_seconds, sample_rate);

                loop {
                    if stop_flag.load(Ordering::SeqCst) {
                        break;
                    }

                    // Wait with a timeout so the stop flag is re-checked even
                    // when no frames are arriving.
                    let frame =
                        match tokio::time::timeout(FRAME_RECV_TIMEOUT, frame_rx.recv()).await {
                            Ok(Some(frame)) => frame,
                            Ok(None) => {
                                info!("Audio source ended");
                                break;
                            }
                            Err(_) => continue,
                        };

                    counters
                        .frames_dropped
                        .store(source.frames_dropped(), Ordering::Relaxed);

                    let normalized = normalize_frame(&frame, sample_rate, channels);

                    {
                        let mut audio = all_audio.lock().await;
                        audio.extend_from_slice(&normalized.samples);
                    }

                    let mut consumer_gone = false;
                    for chunk in chunker.push(&normalized.samples) {
                        // Backpressure lands here, not in the device callback:
                        // block until the transcription side takes the chunk.
                        if chunk_tx.send(chunk).await.is_err() {
                            consumer_gone = true;
                            break;
                        }
                    }
                    if consumer_gone {
                        break;
                    }
                }

                counters
                    .frames_dropped
                    .store(source.frames_dropped(), Ordering::Relaxed);

                if chunker.buffered_samples() > 0 {
                    debug!(
                        "Discarding {}ms partial chunk at session end",
                        chunker.buffered_duration_ms()
                    );
                }

                if let Err(e) = source.stop().await {
                    warn!("Failed to stop audio source: {}", e);
                }

                // Mark the session over even if the source ended on its own;
                // dropping chunk_tx lets the transcription worker drain out.
                stop_flag.store(true, Ordering::SeqCst);
                info!("Capture worker stopped");
            })
        };

        // Transcription worker: chunks in, transcript segments out.
        let transcribe_task = {
            let transcripts = Arc::clone(&transcripts);
            let counters = Arc::clone(&counters);
            let timestamp_lines = config.timestamp_lines;
            let mut chunk_rx = chunk_rx;

            tokio::spawn(async move {
                info!("Transcription worker started ({})", transcriber.name());

                // recv returns None only once capture has hung up and every
                // buffered chunk is taken, so stop never loses queued audio.
                while let Some(chunk) = chunk_rx.recv().await {
                    let index = chunk.index;

                    let wav = match encode_wav(&chunk.samples, chunk.sample_rate, chunk.channels) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            counters.chunks_failed.fetch_add(1, Ordering::Relaxed);
                            warn!("Failed to encode chunk {}: {}", index, e);
                            continue;
                        }
                    };

                    match transcriber.transcribe(wav).await {
                        Ok(text) => {
                            counters.chunks_transcribed.fetch_add(1, Ordering::Relaxed);

                            if text.is_empty() {
                                debug!("Chunk {} transcribed to silence", index);
                                continue;
                            }

                            let segment = transcripts.append(text).await;
                            info!("[chunk {}] {}", index, segment.text);

                            // Writer gone is not fatal; the store still gets
                            // every segment.
                            let _ = line_tx.send(format_line(&segment, timestamp_lines)).await;
                        }
                        Err(e) => {
                            // Dropping the chunk is deliberate: one flaky
                            // provider call must not stall the session.
                            counters.chunks_failed.fetch_add(1, Ordering::Relaxed);
                            warn!("Transcription failed for chunk {} (dropped): {}", index, e);
                        }
                    }
                }

                info!("Transcription worker stopped");
            })
        };

        // Persistence worker: appends transcript lines as they arrive.
        let persist_task = {
            let path = config.transcript_path.clone();
            let mut line_rx = line_rx;

            tokio::spawn(async move {
                let file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await;

                let mut file = match file {
                    Ok(f) => f,
                    Err(e) => {
                        error!("Cannot open transcript file {}: {}", path.display(), e);
                        // Keep draining so the transcription worker never
                        // stalls on a dead writer.
                        while line_rx.recv().await.is_some() {}
                        return;
                    }
                };

                info!("Appending transcript lines to {}", path.display());

                while let Some(line) = line_rx.recv().await {
                    if let Err(e) = file.write_all(line.as_bytes()).await {
                        warn!("Failed to write transcript line: {}", e);
                        continue;
                    }
                    if let Err(e) = file.write_all(b"\n").await {
                        warn!("Failed to write transcript line: {}", e);
                    }
                    // Flush per line; this file gets tailed live.
                    if let Err(e) = file.flush().await {
                        warn!("Failed to flush transcript file: {}", e);
                    }
                }

                info!("Transcript writer stopped");
            })
        };

        let max_duration = config.max_duration;

        let session = Arc::new(Self {
            config,
            transcripts,
            started_at: Utc::now(),
            stopped_at: Mutex::new(None),
            stop_flag,
            finish_started: AtomicBool::new(false),
            counters,
            all_audio,
            capture_task: Mutex::new(Some(capture_task)),
            transcribe_task: Mutex::new(Some(transcribe_task)),
            persist_task: Mutex::new(Some(persist_task)),
            timer_task: Mutex::new(None),
            finish_task: Mutex::new(None),
        });

        // Supervisory timer: stop the session once the configured maximum
        // duration elapses.
        if let Some(max_duration) = max_duration {
            let weak = Arc::downgrade(&session);
            let timer = tokio::spawn(async move {
                tokio::time::sleep(max_duration).await;
                if let Some(session) = weak.upgrade() {
                    if session.is_recording() {
                        info!(
                            "Maximum duration reached ({}s); stopping session",
                            max_duration.as_secs()
                        );
                        session.stop().await;
                    }
                }
            });
            *session.timer_task.lock().await = Some(timer);
        }

        info!("Recording session started: {}", session.config.session_id);
        Ok(session)
    }

    /// Request stop and return immediately; the pipeline drains in the
    /// background. Safe to call repeatedly.
    pub async fn stop(self: &Arc<Self>) {
        self.stop_flag.store(true, Ordering::SeqCst);

        // Decide and store under the slot lock so a concurrent
        // `stop_and_join` can never observe the flag set but the slot empty.
        let mut slot = self.finish_task.lock().await;
        if self.finish_started.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Stopping recording session: {}", self.config.session_id);

        let session = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            session.finish().await;
        }));
    }

    /// Stop and wait until every worker has wound down and the session audio
    /// (if configured) is on disk. Used at process shutdown and before a new
    /// session replaces this one.
    pub async fn stop_and_join(self: &Arc<Self>) {
        self.stop().await;

        let finisher = self.finish_task.lock().await.take();
        if let Some(task) = finisher {
            if let Err(e) = task.await {
                error!("Session finisher panicked: {}", e);
            }
        }
    }

    /// Join the workers in pipeline order, then export audio.
    async fn finish(&self) {
        if let Some(task) = self.timer_task.lock().await.take() {
            task.abort();
        }

        {
            let mut handle = self.capture_task.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Capture worker panicked: {}", e);
                }
            }
        }

        {
            let mut handle = self.transcribe_task.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Transcription worker panicked: {}", e);
                }
            }
        }

        {
            let mut handle = self.persist_task.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Transcript writer panicked: {}", e);
                }
            }
        }

        *self.stopped_at.lock().await = Some(Utc::now());

        if self.config.save_audio {
            let samples = std::mem::take(&mut *self.all_audio.lock().await);
            if samples.is_empty() {
                debug!("No audio captured; skipping WAV export");
            } else if let Err(e) = write_wav_file(
                &self.config.audio_path,
                &samples,
                self.config.sample_rate,
                self.config.channels,
            ) {
                error!("Failed to save session audio: {}", e);
            }
        }

        info!("Recording session stopped: {}", self.config.session_id);
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn is_recording(&self) -> bool {
        !self.stop_flag.load(Ordering::SeqCst)
    }

    /// Current session statistics
    pub async fn stats(&self) -> SessionStats {
        let end = self.stopped_at.lock().await.unwrap_or_else(Utc::now);
        let duration = end.signed_duration_since(self.started_at);

        SessionStats {
            is_recording: self.is_recording(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_transcribed: self.counters.chunks_transcribed(),
            chunks_failed: self.counters.chunks_failed(),
            frames_dropped: self.counters.frames_dropped(),
            transcript_segments: self.transcripts.len().await,
        }
    }
}

fn format_line(segment: &TranscriptSegment, with_timestamp: bool) -> String {
    if with_timestamp {
        format!(
            "[{}] {}",
            segment.timestamp.format("%H:%M:%S"),
            segment.text
        )
    } else {
        segment.text.clone()
    }
}
