//! Playback and tracking loop
//!
//! A [`TrackingSession`] owns the frame source, the tracker and the renderer
//! for one run. Dropping the session releases the video handle and the
//! windows, whichever way the run ended.

use crate::error::Result;
use crate::image_utils::{FAILURE_COLOR, LABEL_COLOR};
use crate::renderer::{HighGuiRenderer, Renderer};
use crate::tracker_factory::TrackerFactory;
use crate::tracker_trait::ObjectTracker;
use crate::types::{BoundingBox, TrackingConfig, VideoProperties};
use crate::video::{FrameSource, VideoCaptureSource, VideoSource};
use opencv::core::Mat;
use std::thread;
use std::time::{Duration, Instant};

/// Text drawn instead of the box when an update fails
pub const FAILURE_TEXT: &str = "Tracking failure detected";
pub const FAILURE_TEXT_ORIGIN: (i32, i32) = (80, 140);
pub const LABEL_ORIGIN: (i32, i32) = (80, 60);

/// How long each iteration polls the keyboard
pub const KEY_POLL_MS: i32 = 1;

/// Per-run settings of the loop itself
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Drawn on every frame
    pub label: String,
    pub quit_key: char,
    /// Fixed sleep after each frame
    pub frame_delay: Duration,
}

impl From<&TrackingConfig> for LoopOptions {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            label: config.tracker.label(),
            quit_key: config.quit_key,
            frame_delay: Duration::from_millis(config.frame_delay_ms),
        }
    }
}

/// Tracking run statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingStats {
    /// Frames passed to `update` (the initialization frame is not counted)
    pub frames: u64,
    pub tracked: u64,
    pub failed: u64,
    pub stopped_by_user: bool,
    pub elapsed: Duration,
    pub average_fps: f64,
}

impl TrackingStats {
    fn finish(&mut self, started: Instant) {
        self.elapsed = started.elapsed();
        let secs = self.elapsed.as_secs_f64();
        if self.frames > 0 && secs > 0.0 {
            self.average_fps = self.frames as f64 / secs;
        }
    }
}

/// Key codes carry modifier bits above the low byte
fn is_quit_key(key: i32, quit_key: char) -> bool {
    key >= 0 && (key & 0xFF) == quit_key as i32
}

/// Run the loop until the source is exhausted or the quit key is pressed.
/// `tracker` must already be initialized.
pub fn run_tracking_loop<S, T, R>(
    source: &mut S,
    tracker: &mut T,
    renderer: &mut R,
    options: &LoopOptions,
) -> Result<TrackingStats>
where
    S: FrameSource + ?Sized,
    T: ObjectTracker<S::Frame> + ?Sized,
    R: Renderer<S::Frame> + ?Sized,
{
    let started = Instant::now();
    let mut stats = TrackingStats::default();

    while let Some(mut frame) = source.read_frame()? {
        stats.frames += 1;

        match tracker.update(&frame)? {
            Some(bbox) => {
                stats.tracked += 1;
                renderer.draw_box(&mut frame, &bbox)?;
            }
            None => {
                stats.failed += 1;
                log::warn!("Tracking failure on frame {}", stats.frames);
                renderer.draw_text(
                    &mut frame,
                    FAILURE_TEXT,
                    FAILURE_TEXT_ORIGIN,
                    FAILURE_COLOR,
                )?;
            }
        }

        renderer.draw_text(&mut frame, &options.label, LABEL_ORIGIN, LABEL_COLOR)?;
        renderer.show(&frame)?;

        if is_quit_key(renderer.wait_key(KEY_POLL_MS)?, options.quit_key) {
            log::info!("Stopped by user after {} frames", stats.frames);
            stats.stopped_by_user = true;
            break;
        }

        if stats.frames % 100 == 0 {
            log::debug!(
                "Processed {} frames ({} tracked, {} failed)",
                stats.frames,
                stats.tracked,
                stats.failed
            );
        }

        if !options.frame_delay.is_zero() {
            thread::sleep(options.frame_delay);
        }
    }

    stats.finish(started);
    Ok(stats)
}

/// One tracking run: source, tracker and renderer acquired together and
/// released together
pub struct TrackingSession<S: FrameSource, R> {
    source: S,
    tracker: Box<dyn ObjectTracker<S::Frame>>,
    renderer: R,
    initial_bbox: BoundingBox,
    options: LoopOptions,
}

impl<S, R> TrackingSession<S, R>
where
    S: FrameSource,
    R: Renderer<S::Frame>,
{
    /// Acquire everything a run needs, in order: source, tracker, renderer.
    /// If the source cannot be opened nothing else is created.
    pub fn open<FS, FR>(
        config: &TrackingConfig,
        factory: &TrackerFactory<S::Frame>,
        open_source: FS,
        open_renderer: FR,
    ) -> Result<Self>
    where
        FS: FnOnce(&VideoSource) -> Result<S>,
        FR: FnOnce(&VideoProperties) -> Result<R>,
    {
        config.validate()?;

        let source = open_source(&config.source)?;
        let tracker = factory.create(config.tracker, config)?;
        let renderer = open_renderer(&source.properties())?;

        Ok(Self {
            source,
            tracker,
            renderer,
            initial_bbox: config.initial_bbox,
            options: LoopOptions::from(config),
        })
    }

    /// Initialize the tracker on the first frame and play the rest
    pub fn run(mut self) -> Result<TrackingStats> {
        let first = match self.source.read_frame()? {
            Some(frame) => frame,
            None => {
                log::warn!("Video contains no frames, nothing to track");
                return Ok(TrackingStats::default());
            }
        };

        let bbox = self.initial_bbox;
        self.renderer.preview(&first, &bbox)?;

        log::info!("Initializing {} with box {}", self.options.label, bbox);
        if !self.tracker.init(&first, bbox)? {
            log::warn!("{} rejected the initial box {}", self.options.label, bbox);
        }

        let stats = run_tracking_loop(
            &mut self.source,
            &mut self.tracker,
            &mut self.renderer,
            &self.options,
        )?;

        log::info!(
            "Tracking finished: {} frames, {} tracked, {} failed, {:.1} FPS",
            stats.frames,
            stats.tracked,
            stats.failed,
            stats.average_fps
        );
        Ok(stats)
    }
}

impl TrackingSession<VideoCaptureSource, HighGuiRenderer> {
    /// Session on an OpenCV capture, OpenCV tracker and highgui window
    pub fn open_opencv(config: &TrackingConfig) -> Result<Self> {
        let factory = TrackerFactory::<Mat>::opencv();
        Self::open(config, &factory, VideoCaptureSource::open, |properties| {
            HighGuiRenderer::new(&config.window_name, properties, config.preview.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::tracker_trait::TrackerVariant;
    use crate::types::{Color, INITIAL_BBOX};
    use std::cell::RefCell;
    use std::collections::{HashSet, VecDeque};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        SourceReleased,
        Preview(u32, BoundingBox),
        Init(u32, BoundingBox),
        Update(u32),
        DrawBox(u32),
        DrawText(u32, String, Color),
        Show(u32),
        RendererClosed,
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct ScriptedSource {
        frames: VecDeque<u32>,
        fail_after: Option<u32>,
        log: Log,
    }

    impl ScriptedSource {
        fn new(count: u32, log: &Log) -> Self {
            Self {
                frames: (0..count).collect(),
                fail_after: None,
                log: Rc::clone(log),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        type Frame = u32;

        fn properties(&self) -> VideoProperties {
            VideoProperties {
                width: 1920,
                height: 1080,
                fps: 25.0,
                frame_count: self.frames.len() as i64,
            }
        }

        fn read_frame(&mut self) -> Result<Option<u32>> {
            let next = self.frames.pop_front();
            match (next, self.fail_after) {
                (Some(frame), Some(limit)) if frame > limit => {
                    Err(TrackerError::frame_read("decoder error"))
                }
                _ => Ok(next),
            }
        }
    }

    impl Drop for ScriptedSource {
        fn drop(&mut self) {
            self.log.borrow_mut().push(Event::SourceReleased);
        }
    }

    struct ScriptedTracker {
        failing_frames: HashSet<u32>,
        accept_init: bool,
        log: Log,
    }

    impl ObjectTracker<u32> for ScriptedTracker {
        fn init(&mut self, frame: &u32, bbox: BoundingBox) -> Result<bool> {
            self.log.borrow_mut().push(Event::Init(*frame, bbox));
            Ok(self.accept_init)
        }

        fn update(&mut self, frame: &u32) -> Result<Option<BoundingBox>> {
            self.log.borrow_mut().push(Event::Update(*frame));
            if self.failing_frames.contains(frame) {
                Ok(None)
            } else {
                Ok(Some(BoundingBox::new(*frame as f64, 0.0, 10.0, 10.0)))
            }
        }
    }

    struct RecordingRenderer {
        keys: VecDeque<i32>,
        log: Log,
    }

    impl Renderer<u32> for RecordingRenderer {
        fn preview(&mut self, frame: &u32, bbox: &BoundingBox) -> Result<()> {
            self.log.borrow_mut().push(Event::Preview(*frame, *bbox));
            Ok(())
        }

        fn draw_box(&mut self, frame: &mut u32, _bbox: &BoundingBox) -> Result<()> {
            self.log.borrow_mut().push(Event::DrawBox(*frame));
            Ok(())
        }

        fn draw_text(
            &mut self,
            frame: &mut u32,
            text: &str,
            _origin: (i32, i32),
            color: Color,
        ) -> Result<()> {
            self.log
                .borrow_mut()
                .push(Event::DrawText(*frame, text.to_string(), color));
            Ok(())
        }

        fn show(&mut self, frame: &u32) -> Result<()> {
            self.log.borrow_mut().push(Event::Show(*frame));
            Ok(())
        }

        fn wait_key(&mut self, _delay_ms: i32) -> Result<i32> {
            Ok(self.keys.pop_front().unwrap_or(-1))
        }
    }

    impl Drop for RecordingRenderer {
        fn drop(&mut self) {
            self.log.borrow_mut().push(Event::RendererClosed);
        }
    }

    fn test_config(variant: TrackerVariant) -> TrackingConfig {
        TrackingConfig {
            tracker: variant,
            frame_delay_ms: 0,
            ..Default::default()
        }
    }

    fn scripted_factory(failing: &[u32], accept_init: bool, log: &Log) -> TrackerFactory<u32> {
        let failing: HashSet<u32> = failing.iter().copied().collect();
        let log = Rc::clone(log);
        TrackerFactory::new(move |_variant| {
            let failing = failing.clone();
            let log = Rc::clone(&log);
            Box::new(move |_config: &TrackingConfig| {
                Ok(Box::new(ScriptedTracker {
                    failing_frames: failing.clone(),
                    accept_init,
                    log: Rc::clone(&log),
                }) as Box<dyn ObjectTracker<u32>>)
            })
        })
    }

    fn run_scripted(
        frame_count: u32,
        failing: &[u32],
        keys: &[i32],
        log: &Log,
    ) -> Result<TrackingStats> {
        let config = test_config(TrackerVariant::Csrt);
        let factory = scripted_factory(failing, true, log);
        let session = TrackingSession::open(
            &config,
            &factory,
            |_source| Ok(ScriptedSource::new(frame_count, log)),
            |_properties| {
                Ok(RecordingRenderer {
                    keys: keys.iter().copied().collect(),
                    log: Rc::clone(log),
                })
            },
        )?;
        session.run()
    }

    fn frames_where(log: &Log, pred: impl Fn(&Event) -> Option<u32>) -> Vec<u32> {
        log.borrow().iter().filter_map(pred).collect()
    }

    #[test]
    fn test_empty_video_performs_no_updates() {
        let log: Log = Rc::default();
        let stats = run_scripted(0, &[], &[], &log).unwrap();

        assert_eq!(stats, TrackingStats::default());
        let events = log.borrow();
        assert!(!events.iter().any(|e| matches!(e, Event::Init(..) | Event::Update(_))));
        assert!(events.contains(&Event::SourceReleased));
        assert!(events.contains(&Event::RendererClosed));
    }

    #[test]
    fn test_failed_open_creates_nothing_else() {
        let log: Log = Rc::default();
        let constructed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&constructed);
        let factory: TrackerFactory<u32> = TrackerFactory::new(move |_variant| {
            let counter = Rc::clone(&counter);
            Box::new(move |_config: &TrackingConfig| {
                *counter.borrow_mut() += 1;
                Err(TrackerError::tracker_create("should not be reached"))
            })
        });
        let mut window_created = false;

        let result = TrackingSession::<ScriptedSource, RecordingRenderer>::open(
            &test_config(TrackerVariant::Kcf),
            &factory,
            |source| Err(TrackerError::video(source.to_string())),
            |_properties| {
                window_created = true;
                Ok(RecordingRenderer {
                    keys: VecDeque::new(),
                    log: Rc::clone(&log),
                })
            },
        );

        assert!(matches!(result, Err(TrackerError::VideoOpen(msg)) if msg == "race_car.mp4"));
        assert!(!window_created);
        assert_eq!(*constructed.borrow(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_all_updates_succeed() {
        let log: Log = Rc::default();
        // Frame 0 initializes the tracker, frames 1..=5 are tracked
        let stats = run_scripted(6, &[], &[], &log).unwrap();

        assert_eq!(stats.frames, 5);
        assert_eq!(stats.tracked, 5);
        assert_eq!(stats.failed, 0);
        assert!(!stats.stopped_by_user);

        let boxes = frames_where(&log, |e| match e {
            Event::DrawBox(f) => Some(*f),
            _ => None,
        });
        assert_eq!(boxes, vec![1, 2, 3, 4, 5]);

        let shown = frames_where(&log, |e| match e {
            Event::Show(f) => Some(*f),
            _ => None,
        });
        assert_eq!(shown, boxes);

        let failures = frames_where(&log, |e| match e {
            Event::DrawText(f, text, _) if text == FAILURE_TEXT => Some(*f),
            _ => None,
        });
        assert!(failures.is_empty());
    }

    #[test]
    fn test_failed_frames_show_failure_text_only() {
        let log: Log = Rc::default();
        let stats = run_scripted(8, &[2, 5, 6], &[], &log).unwrap();

        assert_eq!(stats.frames, 7);
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.tracked, 4);

        let boxes = frames_where(&log, |e| match e {
            Event::DrawBox(f) => Some(*f),
            _ => None,
        });
        assert_eq!(boxes, vec![1, 3, 4, 7]);

        let failures = frames_where(&log, |e| match e {
            Event::DrawText(f, text, color) if text == FAILURE_TEXT => {
                assert_eq!(*color, FAILURE_COLOR);
                Some(*f)
            }
            _ => None,
        });
        assert_eq!(failures, vec![2, 5, 6]);

        let labels = frames_where(&log, |e| match e {
            Event::DrawText(f, text, color) if text == "CSRT Tracker" => {
                assert_eq!(*color, LABEL_COLOR);
                Some(*f)
            }
            _ => None,
        });
        assert_eq!(labels, (1..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_tracker_initialized_with_literal_box() {
        let log: Log = Rc::default();
        run_scripted(3, &[], &[], &log).unwrap();

        let events = log.borrow();
        let inits: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, Event::Init(..)))
            .collect();
        assert_eq!(inits, vec![&Event::Init(0, INITIAL_BBOX)]);
        assert_eq!(INITIAL_BBOX, BoundingBox::new(1300.0, 405.0, 160.0, 120.0));

        // Preview happens on the same frame, before init, with the same box
        assert_eq!(events[0], Event::Preview(0, INITIAL_BBOX));
        assert_eq!(events[1], Event::Init(0, INITIAL_BBOX));
    }

    #[test]
    fn test_quit_key_stops_loop() {
        let log: Log = Rc::default();
        // Modifier bits above the low byte are ignored
        let keys = [-1, 'x' as i32, 0x10000 | 'q' as i32];
        let stats = run_scripted(10, &[], &keys, &log).unwrap();

        assert!(stats.stopped_by_user);
        assert_eq!(stats.frames, 3);
        let last = log.borrow().iter().rev().find_map(|e| match e {
            Event::Update(f) => Some(*f),
            _ => None,
        });
        assert_eq!(last, Some(3));
    }

    #[test]
    fn test_rejected_init_keeps_running() {
        let log: Log = Rc::default();
        let config = test_config(TrackerVariant::Mosse);
        let factory = scripted_factory(&[], false, &log);
        let session = TrackingSession::open(
            &config,
            &factory,
            |_source| Ok(ScriptedSource::new(4, &log)),
            |_properties| {
                Ok(RecordingRenderer {
                    keys: VecDeque::new(),
                    log: Rc::clone(&log),
                })
            },
        )
        .unwrap();

        let stats = session.run().unwrap();
        assert_eq!(stats.frames, 3);
    }

    #[test]
    fn test_read_error_releases_resources() {
        let log: Log = Rc::default();
        let config = test_config(TrackerVariant::Kcf);
        let factory = scripted_factory(&[], true, &log);
        let session = TrackingSession::open(
            &config,
            &factory,
            |_source| {
                let mut source = ScriptedSource::new(10, &log);
                source.fail_after = Some(2);
                Ok(source)
            },
            |_properties| {
                Ok(RecordingRenderer {
                    keys: VecDeque::new(),
                    log: Rc::clone(&log),
                })
            },
        )
        .unwrap();

        let result = session.run();
        assert!(matches!(result, Err(TrackerError::FrameRead(_))));

        let events = log.borrow();
        let released = events.iter().filter(|e| **e == Event::SourceReleased).count();
        let closed = events.iter().filter(|e| **e == Event::RendererClosed).count();
        assert_eq!(released, 1);
        assert_eq!(closed, 1);
    }

    #[test]
    fn test_loop_options_from_config() {
        let options = LoopOptions::from(&TrackingConfig::default());
        assert_eq!(options.label, "GOTURN Tracker");
        assert_eq!(options.quit_key, 'q');
        assert_eq!(options.frame_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_quit_key_masking() {
        assert!(is_quit_key('q' as i32, 'q'));
        assert!(is_quit_key(0x100000 | 'q' as i32, 'q'));
        assert!(!is_quit_key(-1, 'q'));
        assert!(!is_quit_key('Q' as i32, 'q'));
    }
}
