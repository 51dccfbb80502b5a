//! End-to-end lifecycle tests on the software surface

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use glint_harness::archive::{partial_path, ArchiveReader, ArchiveWriter};
use glint_harness::software::{SoftwareProvider, SoftwareSurface};
use glint_harness::{
    ArchiveMode, CompareSettings, Defaults, EffectiveConfiguration, FailureKind, HarnessConfig,
    Host, Outcome, PresentMode, RunResult, SurfaceError, SurfaceProvider, TestInfo, TestRunner,
    TestSuite,
};
use image::{ImageBuffer, Rgb, RgbImage};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Host that remembers every notification
#[derive(Default)]
struct RecordingHost {
    suites: Vec<TestSuite<SoftwareSurface>>,
    events: Vec<String>,
    outcomes: Vec<(TestInfo, Outcome)>,
}

impl Host<SoftwareSurface> for RecordingHost {
    fn test_cases(&mut self) -> Vec<TestSuite<SoftwareSurface>> {
        std::mem::take(&mut self.suites)
    }

    fn started(&mut self, test: &TestInfo) {
        self.events.push(format!("started {}", test));
    }

    fn report(&mut self, test: &TestInfo, outcome: &Outcome) {
        self.events.push(format!("report {}", test));
        self.outcomes.push((test.clone(), outcome.clone()));
    }
}

fn harness(dir: &Path) -> HarnessConfig {
    HarnessConfig::default()
        .with_reference_dir(dir.join("refs"))
        .with_output_dir(dir.join("out"))
        .with_diagnostics_dir(dir.join("diff"))
}

fn fast_defaults() -> Defaults {
    Defaults {
        width: 8,
        height: 8,
        fps: 0,
        iterations: 3,
        ..Defaults::default()
    }
}

fn run(harness: HarnessConfig, suite: TestSuite<SoftwareSurface>) -> (RunResult, RecordingHost) {
    run_with(SoftwareProvider::new(), harness, suite)
}

fn run_with(
    provider: SoftwareProvider,
    harness: HarnessConfig,
    suite: TestSuite<SoftwareSurface>,
) -> (RunResult, RecordingHost) {
    let runner = TestRunner::new(provider, harness).with_defaults(fast_defaults());
    let mut host = RecordingHost {
        suites: vec![suite],
        ..RecordingHost::default()
    };
    let result = runner.run(&mut host);
    (result, host)
}

fn frames_of(path: &Path) -> Vec<RgbImage> {
    let mut reader = ArchiveReader::open(path).unwrap();
    (0..reader.len())
        .map(|_| reader.next_frame().unwrap().image)
        .collect()
}

fn solid(color: [u8; 4]) -> RgbImage {
    ImageBuffer::from_pixel(8, 8, Rgb([color[0], color[1], color[2]]))
}

fn write_reference(harness: &HarnessConfig, name: &str, frames: &[RgbImage]) {
    let mut writer = ArchiveWriter::create(&harness.reference_path(name), name).unwrap();
    for frame in frames {
        writer.append(frame).unwrap();
    }
    writer.finish().unwrap();
}

fn only_outcome(host: &RecordingHost) -> &Outcome {
    assert_eq!(host.outcomes.len(), 1);
    &host.outcomes[0].1
}

fn kinds(outcome: &Outcome) -> Vec<FailureKind> {
    outcome.failures().iter().map(|f| f.kind).collect()
}

fn counter() -> (Arc<AtomicU32>, Arc<AtomicU32>) {
    let count = Arc::new(AtomicU32::new(0));
    (count.clone(), count)
}

#[test]
fn single_iteration_runs_body_once() {
    let dir = tempfile::tempdir().unwrap();
    let (calls, seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("loop");
    suite
        .add("once", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .iterations(1);

    let (result, host) = run(harness(dir.path()), suite);
    assert!(result.all_passed());
    assert_eq!(*only_outcome(&host), Outcome::Passed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn frames_are_numbered_up_to_the_budget() {
    let dir = tempfile::tempdir().unwrap();
    let frames = Arc::new(Mutex::new(Vec::new()));
    let seen = frames.clone();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("loop");
    suite
        .add("five", move |ctx| {
            seen.lock().unwrap().push(ctx.frame);
            Ok(())
        })
        .iterations(5);

    run(harness(dir.path()), suite);
    assert_eq!(*frames.lock().unwrap(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn suite_settings_are_inherited_and_overridden() {
    let dir = tempfile::tempdir().unwrap();
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let seen = sizes.clone();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("config");
    suite.with_settings(
        glint_harness::SettingsLayer::new()
            .with_iterations(120)
            .with_window(16, 4),
    );
    suite
        .add("override", move |ctx| {
            seen.lock()
                .unwrap()
                .push((ctx.config.max_iterations, ctx.config.width, ctx.config.height));
            Ok(())
        })
        .iterations(1);

    run(harness(dir.path()), suite);
    assert_eq!(*sizes.lock().unwrap(), vec![(1, 16, 4)]);
}

#[test]
fn hooks_run_once_around_the_frames() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("hooks");
    let l = log.clone();
    suite.before(move |_| {
        l.lock().unwrap().push("suite before".to_string());
        Ok(())
    });
    let l = log.clone();
    suite.after(move |_| {
        l.lock().unwrap().push("suite after".to_string());
        Ok(())
    });

    let body_log = log.clone();
    let before_log = log.clone();
    let after_log = log.clone();
    suite
        .add("case", move |ctx| {
            body_log.lock().unwrap().push(format!("frame {}", ctx.frame));
            Ok(())
        })
        .iterations(2)
        .before(move |ctx| {
            before_log.lock().unwrap().push(format!("case before {}", ctx.frame));
            Ok(())
        })
        .after(move |_| {
            after_log.lock().unwrap().push("case after".to_string());
            Ok(())
        });

    run(harness(dir.path()), suite);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "suite before",
            "case before 0",
            "frame 1",
            "frame 2",
            "case after",
            "suite after",
        ]
    );
}

#[test]
fn body_error_stops_the_loop_at_the_next_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let (calls, seen) = counter();
    let (afters, after_seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("errors");
    suite
        .add("fails_on_second_frame", move |ctx| {
            seen.fetch_add(1, Ordering::SeqCst);
            if ctx.frame == 2 {
                anyhow::bail!("bad frame");
            }
            Ok(())
        })
        .iterations(10)
        .after(move |_| {
            after_seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let (result, host) = run(harness(dir.path()), suite);
    assert_eq!(result.failed(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(afters.load(Ordering::SeqCst), 1);

    let outcome = only_outcome(&host);
    assert_eq!(kinds(outcome), vec![FailureKind::Body]);
    assert_eq!(outcome.failures()[0].message, "frame 2 failed: bad frame");
}

#[test]
fn panicking_body_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("errors");
    suite.add("asserts", |ctx| {
        assert_eq!(ctx.frame, 0, "frames start at one");
        Ok(())
    });

    let (_, host) = run(harness(dir.path()), suite);
    assert_eq!(kinds(only_outcome(&host)), vec![FailureKind::Body]);
}

#[test]
fn before_hook_failure_skips_frames_but_not_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let (calls, seen) = counter();
    let (afters, after_seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("hooks");
    suite
        .add("broken_setup", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .before(|_| anyhow::bail!("no shader"))
        .before(|_| anyhow::bail!("no buffers"))
        .after(move |_| {
            after_seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let (_, host) = run(harness(dir.path()), suite);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(afters.load(Ordering::SeqCst), 1);
    assert_eq!(
        kinds(only_outcome(&host)),
        vec![FailureKind::Hook, FailureKind::Hook]
    );
}

#[test]
fn multiple_failures_are_one_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("errors");
    suite
        .add("everything_breaks", |_| anyhow::bail!("body"))
        .after(|_| anyhow::bail!("after"));
    suite.add("fine", |_| Ok(()));

    let (_, host) = run(harness(dir.path()), suite);
    assert_eq!(
        host.events,
        vec![
            "started errors::everything_breaks",
            "report errors::everything_breaks",
            "started errors::fine",
            "report errors::fine",
        ]
    );
    assert_eq!(
        kinds(&host.outcomes[0].1),
        vec![FailureKind::Body, FailureKind::Hook]
    );
    assert_eq!(host.outcomes[1].1, Outcome::Passed);
}

#[test]
fn unsupported_profile_fails_setup() {
    let dir = tempfile::tempdir().unwrap();
    let (calls, seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("profiles");
    suite
        .add("gl4", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .profile("gl4")
        .before(|_| anyhow::bail!("must not run"));

    let provider = SoftwareProvider::with_profiles(["primary", "gl"]);
    let (_, host) = run_with(provider, harness(dir.path()), suite);
    assert_eq!(kinds(only_outcome(&host)), vec![FailureKind::Setup]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn expected_setup_failure_passes() {
    let dir = tempfile::tempdir().unwrap();
    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("profiles");
    suite
        .add("needs_gl4", |_| Ok(()))
        .profile("gl4")
        .expect_failure(FailureKind::Setup);

    let provider = SoftwareProvider::with_profiles(["primary"]);
    let (result, host) = run_with(provider, harness(dir.path()), suite);
    assert!(result.all_passed());
    assert_eq!(*only_outcome(&host), Outcome::Passed);
}

/// Provider whose device creation panics instead of returning an error
struct PanickingProvider;

impl SurfaceProvider for PanickingProvider {
    type Surface = SoftwareSurface;

    fn acquire(
        &self,
        _title: &str,
        _config: &EffectiveConfiguration,
    ) -> Result<SoftwareSurface, SurfaceError> {
        panic!("driver crashed");
    }
}

#[test]
fn panic_on_the_frame_thread_is_one_setup_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("panics");
    suite.add("acquire", |_| Ok(()));
    suite.add("next", |_| Ok(()));

    let runner = TestRunner::new(PanickingProvider, harness(dir.path()))
        .with_defaults(fast_defaults());
    let mut host = RecordingHost {
        suites: vec![suite],
        ..RecordingHost::default()
    };
    let result = runner.run(&mut host);

    assert_eq!(result.failed(), 2);
    assert_eq!(
        host.events,
        vec![
            "started panics::acquire",
            "report panics::acquire",
            "started panics::next",
            "report panics::next",
        ]
    );
    let outcome = &host.outcomes[0].1;
    assert_eq!(kinds(outcome), vec![FailureKind::Setup]);
    assert!(outcome.failures()[0].message.contains("driver crashed"));
}

#[test]
fn missing_reference_fails_before_any_frame() {
    let dir = tempfile::tempdir().unwrap();
    let (calls, seen) = counter();
    let (hooks, hook_seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("no_reference", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .compare(CompareSettings::default())
        .before(move |_| {
            hook_seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let (_, host) = run(harness(dir.path()), suite);
    let outcome = only_outcome(&host);
    assert_eq!(kinds(outcome), vec![FailureKind::Setup]);
    assert!(outcome.failures()[0].message.contains("no_reference.zip"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(hooks.load(Ordering::SeqCst), 0);
}

#[test]
fn matching_frames_pass_and_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "red", &[solid(RED), solid(RED), solid(RED)]);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("red", |ctx| {
            ctx.surface.clear(RED);
            Ok(())
        })
        .compare(CompareSettings::default());

    let (_, host) = run(harness.clone(), suite);
    assert_eq!(*only_outcome(&host), Outcome::Passed);

    let mut recorded = ArchiveReader::open(&harness.output_path("red")).unwrap();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded.next_frame().unwrap().image, solid(RED));
}

#[test]
fn record_then_verify_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let colors = [RED, BLUE, [0, 255, 0, 255]];

    let build = || {
        let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
        suite
            .add("cycle", move |ctx| {
                ctx.surface.clear(colors[(ctx.frame as usize - 1) % colors.len()]);
                Ok(())
            })
            .compare(CompareSettings::default());
        suite
    };

    let record = harness(dir.path()).with_mode(ArchiveMode::Record);
    let (result, _) = run(record.clone(), build());
    assert!(result.all_passed());

    let mut reference = ArchiveReader::open(&record.reference_path("cycle")).unwrap();
    assert_eq!(reference.len(), 3);
    for color in colors {
        assert_eq!(reference.next_frame().unwrap().image, solid(color));
    }

    let (result, host) = run(harness(dir.path()), build());
    assert!(result.all_passed());
    assert_eq!(*only_outcome(&host), Outcome::Passed);
}

#[test]
fn failed_test_does_not_leave_a_reference() {
    let dir = tempfile::tempdir().unwrap();
    let record = harness(dir.path()).with_mode(ArchiveMode::Record);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("broken", |_| anyhow::bail!("nothing drawn"))
        .compare(CompareSettings::default());

    let (result, _) = run(record.clone(), suite);
    assert_eq!(result.failed(), 1);
    assert!(!record.reference_path("broken").exists());
}

#[test]
fn failed_rerecord_keeps_the_previous_reference() {
    let dir = tempfile::tempdir().unwrap();
    let record = harness(dir.path()).with_mode(ArchiveMode::Record);
    let path = record.reference_path("kept");
    write_reference(&record, "kept", &[solid(RED), solid(RED), solid(RED)]);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("kept", |ctx| {
            ctx.surface.clear(BLUE);
            if ctx.frame == 2 {
                anyhow::bail!("draw failed");
            }
            Ok(())
        })
        .compare(CompareSettings::default());

    let (result, _) = run(record.clone(), suite);
    assert_eq!(result.failed(), 1);
    assert_eq!(frames_of(&path), vec![solid(RED); 3]);
    assert!(!partial_path(&path).exists());
}

#[test]
fn successful_rerecord_replaces_the_reference() {
    let dir = tempfile::tempdir().unwrap();
    let record = harness(dir.path()).with_mode(ArchiveMode::Record);
    let path = record.reference_path("replaced");
    write_reference(&record, "replaced", &[solid(RED)]);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("replaced", |ctx| {
            ctx.surface.clear(BLUE);
            Ok(())
        })
        .iterations(2)
        .compare(CompareSettings::default());

    let (result, _) = run(record, suite);
    assert!(result.all_passed());
    assert_eq!(frames_of(&path), vec![solid(BLUE); 2]);
    assert!(!partial_path(&path).exists());
}

#[test]
fn verify_with_shared_directories_leaves_the_reference_intact() {
    let dir = tempfile::tempdir().unwrap();
    let refs = dir.path().join("refs");
    let harness = HarnessConfig::default()
        .with_reference_dir(refs.clone())
        .with_output_dir(refs.join("."))
        .with_diagnostics_dir(dir.path().join("diff"));
    write_reference(&harness, "red", &[solid(RED), solid(RED), solid(RED)]);

    let build = || {
        let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
        suite
            .add("red", |ctx| {
                ctx.surface.clear(RED);
                Ok(())
            })
            .compare(CompareSettings::default());
        suite
    };

    let (_, host) = run(harness.clone(), build());
    assert_eq!(*only_outcome(&host), Outcome::Passed);
    let (_, host) = run(harness.clone(), build());
    assert_eq!(*only_outcome(&host), Outcome::Passed);

    let path = harness.reference_path("red");
    assert_eq!(frames_of(&path), vec![solid(RED); 3]);
    assert!(!partial_path(&path).exists());
}

#[test]
fn divergent_frame_fails_with_diff_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "triangle", &[solid(RED)]);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("different_triangle", |ctx| {
            ctx.surface.clear(BLUE);
            Ok(())
        })
        .iterations(1)
        .compare(CompareSettings::reference("triangle"));

    let (_, host) = run(harness.clone(), suite);
    let outcome = only_outcome(&host);
    assert_eq!(kinds(outcome), vec![FailureKind::Threshold]);

    let artifact = outcome.failures()[0].artifact.clone().unwrap();
    assert_eq!(
        artifact,
        harness.diff_path("different_triangle", "triangle_0001.png")
    );
    let diff = image::open(&artifact).unwrap().to_rgb8();
    assert_eq!(diff.get_pixel(0, 0).0, [255, 0, 255]);
}

#[test]
fn threshold_failure_stops_following_frames() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "red", &[solid(RED), solid(RED), solid(RED)]);
    let (calls, seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("red", move |ctx| {
            seen.fetch_add(1, Ordering::SeqCst);
            ctx.surface.clear(BLUE);
            Ok(())
        })
        .compare(CompareSettings::default());

    let (_, host) = run(harness, suite);
    assert_eq!(kinds(only_outcome(&host)), vec![FailureKind::Threshold]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn body_error_keeps_that_frames_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "red", &[solid(RED)]);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("red", |ctx| {
            ctx.surface.clear(BLUE);
            anyhow::bail!("draw failed")
        })
        .iterations(1)
        .compare(CompareSettings::default());

    let (_, host) = run(harness, suite);
    assert_eq!(
        kinds(only_outcome(&host)),
        vec![FailureKind::Body, FailureKind::Threshold]
    );
}

#[test]
fn divergence_at_the_bound_passes() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "gray", &[solid([0, 0, 0, 255])]);

    let build = |max: f64| {
        let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
        suite
            .add("gray", |ctx| {
                ctx.surface.clear([51, 51, 51, 255]);
                Ok(())
            })
            .iterations(1)
            .compare(CompareSettings::default().with_max_divergence(max));
        suite
    };

    let (_, host) = run(harness.clone(), build(0.2));
    assert_eq!(*only_outcome(&host), Outcome::Passed);

    let (_, host) = run(harness, build(0.2 - 1e-6));
    assert_eq!(kinds(only_outcome(&host)), vec![FailureKind::Threshold]);
}

#[test]
fn more_frames_than_reference_entries_is_exhaustion() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "short", &[solid(RED), solid(RED)]);
    let (calls, seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("short", move |ctx| {
            seen.fetch_add(1, Ordering::SeqCst);
            ctx.surface.clear(RED);
            Ok(())
        })
        .iterations(3)
        .compare(CompareSettings::default());

    let (_, host) = run(harness, suite);
    assert_eq!(kinds(only_outcome(&host)), vec![FailureKind::ArchiveExhausted]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn size_mismatch_is_a_dimension_failure() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "small", &[solid(RED)]);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("compare");
    suite
        .add("small", |ctx| {
            ctx.surface.clear(RED);
            Ok(())
        })
        .window(4, 4)
        .iterations(1)
        .compare(CompareSettings::default());

    let (_, host) = run(harness, suite);
    assert_eq!(kinds(only_outcome(&host)), vec![FailureKind::Dimension]);
}

#[test]
fn expected_failure_inverts_the_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let harness = harness(dir.path());
    write_reference(&harness, "triangle", &[solid(RED)]);

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("expected");
    suite
        .add("diverges", |ctx| {
            ctx.surface.clear(BLUE);
            Ok(())
        })
        .iterations(1)
        .compare(CompareSettings::reference("triangle"))
        .expect_failure(FailureKind::Threshold);
    suite
        .add("matches", |ctx| {
            ctx.surface.clear(RED);
            Ok(())
        })
        .iterations(1)
        .compare(CompareSettings::reference("triangle"))
        .expect_failure(FailureKind::Threshold);
    suite
        .add("wrong_kind", |_| anyhow::bail!("crash"))
        .iterations(1)
        .expect_failure(FailureKind::Threshold);

    let (result, host) = run(harness, suite);
    assert_eq!(result.passed(), 1);
    assert_eq!(host.outcomes[0].1, Outcome::Passed);
    assert_eq!(
        kinds(&host.outcomes[1].1),
        vec![FailureKind::ExpectedFailureMissing]
    );
    assert_eq!(kinds(&host.outcomes[2].1), vec![FailureKind::Body]);
}

#[test]
fn manual_mode_presents_every_frame_and_auto_never() {
    let dir = tempfile::tempdir().unwrap();
    let presents = Arc::new(Mutex::new(Vec::new()));

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("present");
    let seen = presents.clone();
    suite
        .add("manual", move |ctx| {
            seen.lock().unwrap().push(("manual", ctx.surface.presents()));
            Ok(())
        })
        .swap(PresentMode::Manual);
    let seen = presents.clone();
    suite
        .add("auto", move |ctx| {
            seen.lock().unwrap().push(("auto", ctx.surface.presents()));
            Ok(())
        })
        .swap(PresentMode::Auto);

    run(harness(dir.path()), suite);
    assert_eq!(
        *presents.lock().unwrap(),
        vec![
            ("manual", 0),
            ("manual", 1),
            ("manual", 2),
            ("auto", 0),
            ("auto", 0),
            ("auto", 0),
        ]
    );
}

#[test]
fn ignored_test_reports_without_running() {
    let dir = tempfile::tempdir().unwrap();
    let (calls, seen) = counter();

    let mut suite: TestSuite<SoftwareSurface> = TestSuite::new("skip");
    suite
        .add("later", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .ignore();

    let (result, host) = run(harness(dir.path()), suite);
    assert_eq!(*only_outcome(&host), Outcome::Ignored);
    assert_eq!(host.events, vec!["started skip::later", "report skip::later"]);
    assert_eq!(result.ignored(), 1);
    assert!(result.all_passed());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
