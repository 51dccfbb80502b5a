//! Test lifecycle orchestration
//!
//! One test case runs through
//!
//! ```text
//! INIT → ACQUIRE_SURFACE → RUN_BEFORE_HOOKS → FRAME_LOOP*
//!      → RUN_AFTER_HOOKS → RELEASE_SURFACE → REPORT
//! ```
//!
//! Everything between acquisition and release happens on a dedicated frame
//! thread that the caller joins; graphics contexts never cross threads.
//! Failures accumulate instead of unwinding, so one test case reports every
//! problem it ran into. The frame loop stops at the first boundary check
//! after any failure was recorded, or once the frame budget is spent.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbImage;

use crate::archive::{ArchiveError, ArchiveReader, ArchiveWriter};
use crate::capture;
use crate::compare;
use crate::config::{
    ArchiveMode, ComparisonSpec, EffectiveConfiguration, HarnessConfig, PresentMode,
};
use crate::outcome::{Failure, FailureKind, Outcome};
use crate::runner::TestCase;
use crate::surface::{Surface, SurfaceProvider};

/// What hooks and the test body see
pub struct FrameContext<'a, S> {
    /// The test case's surface
    pub surface: &'a mut S,
    /// 1-based frame index; 0 while hooks run
    pub frame: u32,
    /// Test name
    pub test_name: &'a str,
    /// Configuration the test runs with
    pub config: &'a EffectiveConfiguration,
}

impl<'a, S> FrameContext<'a, S> {
    /// Get the surface to draw on
    pub fn surface(&mut self) -> &mut S {
        &mut *self.surface
    }
}

/// Runs single test cases against surfaces from a provider
pub struct Orchestrator<'a, P> {
    provider: &'a P,
    harness: &'a HarnessConfig,
}

impl<'a, P: SurfaceProvider> Orchestrator<'a, P> {
    pub fn new(provider: &'a P, harness: &'a HarnessConfig) -> Self {
        Self { provider, harness }
    }

    /// Run one test case to completion and interpret its failures
    pub fn run(&self, case: TestCase<P::Surface>, config: &EffectiveConfiguration) -> Outcome {
        if case.ignored {
            tracing::info!("Skipping ignored test {}", case.name);
            return Outcome::Ignored;
        }

        let expected = case.expected_failure;
        let thread_name = format!("glint-frame-{}", case.name);

        let failures = thread::scope(|scope| {
            let spawned = thread::Builder::new()
                .name(thread_name)
                .spawn_scoped(scope, || self.drive(case, config));

            match spawned {
                Ok(handle) => handle.join().unwrap_or_else(|payload| {
                    vec![Failure::new(
                        FailureKind::Setup,
                        format!("frame thread panicked: {}", panic_message(payload.as_ref())),
                    )]
                }),
                Err(e) => vec![Failure::new(
                    FailureKind::Setup,
                    format!("failed to spawn frame thread: {}", e),
                )],
            }
        });

        Outcome::from_failures(failures, expected)
    }

    /// Frame thread entry point
    fn drive(
        &self,
        mut case: TestCase<P::Surface>,
        config: &EffectiveConfiguration,
    ) -> Vec<Failure> {
        tracing::info!(
            "Running {} on '{}' {}x{} ({} frames, {} fps, {:?} present)",
            case.name,
            config.surface_profile,
            config.width,
            config.height,
            config.max_iterations,
            config.target_fps,
            config.present_mode
        );

        // ACQUIRE_SURFACE
        let mut surface = match self.provider.acquire(&case.name, config) {
            Ok(surface) => surface,
            Err(e) => {
                tracing::error!("Failed to acquire surface for {}: {}", case.name, e);
                return vec![Failure::new(
                    FailureKind::Setup,
                    format!("failed to acquire '{}' surface: {}", config.surface_profile, e),
                )];
            }
        };

        let failures = self.run_with_surface(&mut case, config, &mut surface);

        // RELEASE_SURFACE
        drop(surface);
        tracing::debug!("Released surface for {}", case.name);

        failures
    }

    fn run_with_surface(
        &self,
        case: &mut TestCase<P::Surface>,
        config: &EffectiveConfiguration,
        surface: &mut P::Surface,
    ) -> Vec<Failure> {
        let name = case.name.clone();

        // Reference archives are opened before any hook or frame runs so a
        // missing one fails the test at setup.
        let mut sink = match &config.comparison {
            Some(comparison) => match FrameSink::open(self.harness, &name, comparison) {
                Ok(sink) => Some(sink),
                Err(failure) => return vec![failure],
            },
            None => None,
        };

        let mut failures = Vec::new();

        // RUN_BEFORE_HOOKS
        for (i, hook) in case.before.iter().enumerate() {
            let mut ctx = FrameContext {
                surface: &mut *surface,
                frame: 0,
                test_name: &name,
                config,
            };
            record(&mut failures, FailureKind::Hook, &format!("before hook #{}", i + 1), || {
                hook(&mut ctx)
            });
        }

        // FRAME_LOOP
        let mut pacer = Pacer::new(config.target_fps);
        let mut frame: u32 = 0;
        loop {
            if !failures.is_empty() {
                tracing::debug!("Stopping {} after frame {}: failure recorded", name, frame);
                break;
            }
            if frame >= config.max_iterations {
                break;
            }
            frame += 1;
            pacer.wait();
            tracing::trace!("{}: frame {}", name, frame);

            {
                let mut ctx = FrameContext {
                    surface: &mut *surface,
                    frame,
                    test_name: &name,
                    config,
                };
                let body = &mut case.body;
                record(&mut failures, FailureKind::Body, &format!("frame {}", frame), || {
                    body(&mut ctx)
                });
            }

            // A body failure still lets this frame's capture and comparison run.
            if config.present_mode == PresentMode::Manual {
                if let Err(e) = surface.present() {
                    failures.push(Failure::new(
                        FailureKind::Surface,
                        format!("frame {}: {}", frame, e),
                    ));
                }
            }

            if let Some(sink) = sink.as_mut() {
                match capture::capture_frame(&mut *surface) {
                    Ok(image) => failures.extend(sink.process(frame, &image)),
                    Err(e) => failures.push(Failure::new(
                        FailureKind::Surface,
                        format!("frame {}: capture failed: {}", frame, e),
                    )),
                }
            }
        }
        tracing::debug!("{} ran {} frame(s)", name, frame);

        // RUN_AFTER_HOOKS
        for (i, hook) in case.after.iter().enumerate() {
            let mut ctx = FrameContext {
                surface: &mut *surface,
                frame,
                test_name: &name,
                config,
            };
            record(&mut failures, FailureKind::Hook, &format!("after hook #{}", i + 1), || {
                hook(&mut ctx)
            });
        }

        if let Some(sink) = sink {
            let failed = !failures.is_empty();
            failures.extend(sink.finish(failed));
        }

        failures
    }
}

/// Invoke a callback, recording an error or panic as a failure of `kind`
fn record<F>(failures: &mut Vec<Failure>, kind: FailureKind, what: &str, callback: F)
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!("{} failed: {:#}", what, err);
            failures.push(Failure::new(kind, format!("{} failed: {:#}", what, err)));
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("{} panicked: {}", what, message);
            failures.push(Failure::new(kind, format!("{} panicked: {}", what, message)));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Fixed-rate frame scheduling; late frames restart the schedule
struct Pacer {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl Pacer {
    fn new(fps: u32) -> Self {
        Self {
            interval: (fps > 0).then(|| Duration::from_nanos(1_000_000_000 / u64::from(fps))),
            next: None,
        }
    }

    fn wait(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        let now = Instant::now();
        match self.next {
            Some(deadline) if deadline > now => {
                thread::sleep(deadline - now);
                self.next = Some(deadline + interval);
            }
            _ => self.next = Some(now + interval),
        }
    }
}

/// Where captured frames go for a test with a comparison declared
struct FrameSink<'a> {
    harness: &'a HarnessConfig,
    test_name: &'a str,
    comparison: &'a ComparisonSpec,
    /// `None` when captures would land on the reference being verified
    recorder: Option<ArchiveWriter>,
    reference: Option<ArchiveReader>,
    /// The recorder writes the reference archive itself
    recording_reference: bool,
}

impl<'a> FrameSink<'a> {
    /// In record mode a test whose reference is its own name writes that
    /// reference; every other test verifies against an existing archive and
    /// lands its captures in the output directory.
    fn open(
        harness: &'a HarnessConfig,
        test_name: &'a str,
        comparison: &'a ComparisonSpec,
    ) -> Result<Self, Failure> {
        let recording_reference =
            harness.mode == ArchiveMode::Record && comparison.reference_name == test_name;
        let reference_path = harness.reference_path(&comparison.reference_name);

        let reference = if recording_reference {
            None
        } else {
            let reader = ArchiveReader::open(&reference_path).map_err(|e| {
                tracing::error!("{}: {}", test_name, e);
                Failure::new(FailureKind::Setup, e.to_string())
            })?;
            if reader.is_empty() {
                tracing::warn!("{} holds no frames", reference_path.display());
            }
            tracing::debug!(
                "Opened {} ({} frame(s))",
                reference_path.display(),
                reader.len()
            );
            Some(reader)
        };

        let recording_path = if recording_reference {
            reference_path
        } else {
            let output_path = harness.output_path(test_name);
            if same_location(&output_path, &reference_path) {
                tracing::warn!(
                    "Not recording {}: output would overwrite the reference being verified",
                    test_name
                );
                return Ok(Self {
                    harness,
                    test_name,
                    comparison,
                    recorder: None,
                    reference,
                    recording_reference,
                });
            }
            output_path
        };

        let recorder = ArchiveWriter::create(&recording_path, test_name).map_err(|e| {
            Failure::new(
                FailureKind::Setup,
                format!("failed to create {}: {}", recording_path.display(), e),
            )
        })?;

        Ok(Self {
            harness,
            test_name,
            comparison,
            recorder: Some(recorder),
            reference,
            recording_reference,
        })
    }

    /// Archive one captured frame and compare it with the next reference entry
    fn process(&mut self, frame: u32, image: &RgbImage) -> Vec<Failure> {
        let mut failures = Vec::new();

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.append(image) {
                failures.push(Failure::new(
                    FailureKind::Archive,
                    format!("frame {}: failed to record: {}", frame, e),
                ));
            }
        }

        let Some(reader) = self.reference.as_mut() else {
            return failures;
        };

        let entry = match reader.next_frame() {
            Ok(entry) => entry,
            Err(e @ ArchiveError::Exhausted { .. }) => {
                failures.push(Failure::new(
                    FailureKind::ArchiveExhausted,
                    format!("frame {}: {}", frame, e),
                ));
                return failures;
            }
            Err(e) => {
                failures.push(Failure::new(
                    FailureKind::Archive,
                    format!("frame {}: {}", frame, e),
                ));
                return failures;
            }
        };

        match compare::compare(image, &entry.image) {
            Err(mismatch) => failures.push(Failure::new(
                FailureKind::Dimension,
                format!("frame {} ({}): {}", frame, entry.name, mismatch),
            )),
            Ok(result) if result.passes(self.comparison.max_divergence) => {
                tracing::trace!(
                    "{}: frame {} matches {} ({:.6})",
                    self.test_name,
                    frame,
                    entry.name,
                    result.divergence
                );
            }
            Ok(result) => {
                let message = format!(
                    "frame {} diverges from {}: {:.6} > {:.6}",
                    frame, entry.name, result.divergence, self.comparison.max_divergence
                );
                let diff_path = self.harness.diff_path(self.test_name, &entry.name);
                let failure = match save_diff(&diff_path, &result.diff) {
                    Ok(()) => {
                        Failure::new(FailureKind::Threshold, message).with_artifact(diff_path)
                    }
                    Err(e) => Failure::new(
                        FailureKind::Threshold,
                        format!("{} (diff not written: {})", message, e),
                    ),
                };
                failures.push(failure);
            }
        }

        failures
    }

    /// Finalize the recording. A failed test's reference recording is
    /// dropped and the previous reference, if any, stays in place.
    fn finish(self, failed: bool) -> Option<Failure> {
        let recorder = self.recorder?;
        let frames = recorder.frames();
        let result = if self.recording_reference && failed {
            tracing::warn!(
                "Discarding reference recording of failed test {}",
                self.test_name
            );
            recorder.discard().map(|()| None)
        } else {
            recorder.finish().map(Some)
        };

        match result {
            Ok(Some(path)) => {
                tracing::debug!("Wrote {} frame(s) to {}", frames, path.display());
                None
            }
            Ok(None) => None,
            Err(e) => Some(Failure::new(
                FailureKind::Archive,
                format!("failed to finalize recording: {}", e),
            )),
        }
    }
}

/// Whether two archive paths name the same file
fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    let dir = |path: &Path| {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::canonicalize(parent).ok()
    };
    match (dir(a), dir(b)) {
        (Some(da), Some(db)) => da == db && a.file_name() == b.file_name(),
        _ => false,
    }
}

fn save_diff(path: &Path, diff: &RgbImage) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    diff.save(path)?;
    Ok(())
}
