//! Terminal host for the gyroview viewport

use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::cell::RefCell;
use std::io::{self, stdout, Stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};
use gyroview_core::{
    status, FrameOutcome, Scene, ViewportConfig, ViewportController,
};

pub mod host;
pub mod renderer;

pub use host::{TerminalContainer, TerminalHost};
pub use renderer::{AsciiSurface, CELL_ASPECT};

/// Orbit step per arrow key press, in radians
const ORBIT_STEP: f32 = 0.08;

const HELP: &str = "arrows/drag orbit, +/- zoom, q quit";

type TerminalViewport = ViewportController<TerminalContainer, AsciiSurface<Stdout>, TerminalHost>;

/// Rolling frames-per-second counter
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self { window_start: now, frames: 0, fps: 0.0 }
    }

    /// Count a rendered frame; the rate is refreshed once per second
    pub fn record(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    viewport: TerminalViewport,
    status: Rc<RefCell<String>>,
    running: bool,
    frame_interval: Duration,
    stats: FrameStats,
}

impl TerminalApp {
    pub fn new(scene: Scene, config: ViewportConfig, target_fps: u32) -> Self {
        let mut viewport = ViewportController::new(
            TerminalContainer::new(1),
            AsciiSurface::new(stdout()),
            TerminalHost::new(),
            scene,
            config,
        );

        let status = Rc::new(RefCell::new(String::from("Starting...")));
        let sink = Rc::clone(&status);
        viewport.subscribe_orientation(move |sample| {
            *sink.borrow_mut() = status::status_line(sample);
        });

        Self {
            viewport,
            status,
            running: true,
            frame_interval: Duration::from_secs(1) / target_fps.max(1),
            stats: FrameStats::new(Instant::now()),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        self.viewport.initialize().map_err(io::Error::other)?;

        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide, EnableMouseCapture)?;

        let result = self.main_loop();

        if let Err(e) = self.viewport.teardown() {
            log::warn!("teardown: {e}");
        }

        // Cleanup
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut next_tick = Instant::now();

        while self.running {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                let event = event::read()?;
                self.handle_event(event)?;
            }

            let now = Instant::now();
            if now >= next_tick {
                next_tick = now + self.frame_interval;
                self.tick(now)?;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Resize(_, _) if self.viewport.host().resize_attached() => {
                queue!(stdout(), Clear(ClearType::All))?;
                self.viewport.on_resize().map_err(io::Error::other)?;
            }
            Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => self.handle_key(code),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        let controls = self.viewport.controls_mut();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('a') | KeyCode::Left => controls.rotate_left(-ORBIT_STEP),
            KeyCode::Char('d') | KeyCode::Right => controls.rotate_left(ORBIT_STEP),
            KeyCode::Char('w') | KeyCode::Up => controls.rotate_up(-ORBIT_STEP),
            KeyCode::Char('s') | KeyCode::Down => controls.rotate_up(ORBIT_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => controls.wheel(-1.0),
            KeyCode::Char('-') => controls.wheel(1.0),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let x = mouse.column as f32;
        let y = (mouse.row as u32 * CELL_ASPECT) as f32;
        let controls = self.viewport.controls_mut();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => controls.pointer_down(x, y),
            MouseEventKind::Drag(MouseButton::Left) => controls.pointer_move(x, y),
            MouseEventKind::Up(MouseButton::Left) => controls.pointer_up(),
            MouseEventKind::ScrollUp => controls.wheel(-1.0),
            MouseEventKind::ScrollDown => controls.wheel(1.0),
            _ => {}
        }
    }

    fn tick(&mut self, now: Instant) -> io::Result<()> {
        if !self.viewport.host_mut().take_due() {
            return Ok(());
        }

        match self.viewport.on_frame() {
            Ok(FrameOutcome::Rendered) => {
                self.stats.record(now);
                self.draw_status(Color::Yellow)
            }
            Ok(FrameOutcome::Skipped) => Ok(()),
            Err(e) => {
                *self.status.borrow_mut() = status::stopped_line(e);
                self.draw_status(Color::Red)
            }
        }
    }

    fn draw_status(&self, color: Color) -> io::Result<()> {
        let (width, height) = terminal::size()?;
        let line = format!("{} | FPS: {:.1} | {HELP}", self.status.borrow(), self.stats.fps());
        let line: String = line.chars().take(width as usize).collect();

        let mut stdout = stdout();
        queue!(
            stdout,
            cursor::MoveTo(0, height.saturating_sub(1)),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(color),
            Print(line),
            ResetColor
        )?;
        stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyroview_core::{AssetState, Container, Phase, ViewportSize};

    struct FixedContainer(ViewportSize);

    impl Container for FixedContainer {
        fn measure(&self) -> ViewportSize {
            self.0
        }
    }

    #[test]
    fn test_frame_stats_window() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        for i in 1..=30 {
            stats.record(start + Duration::from_millis(i * 10));
        }
        assert_eq!(stats.fps(), 0.0);

        stats.record(start + Duration::from_secs(1));
        assert!((stats.fps() - 31.0).abs() < 0.01);
    }

    #[test]
    fn test_viewport_on_terminal_host() {
        let config = ViewportConfig::default();
        let scene = Scene::build(&config.scene, AssetState::Pending);
        let mut viewport = ViewportController::new(
            FixedContainer(ViewportSize::new(40, 20)),
            AsciiSurface::new(Vec::new()),
            TerminalHost::new(),
            scene,
            config,
        );

        viewport.initialize().unwrap();
        assert_eq!(viewport.surface().cells(), (40, 10));
        assert_eq!(viewport.surface().pixel_ratio(), 1.0);
        assert!(viewport.host().resize_attached());

        for _ in 0..3 {
            assert!(viewport.host_mut().take_due());
            assert_eq!(viewport.on_frame().unwrap(), FrameOutcome::Rendered);
        }
        assert_eq!(
            viewport.orientation().map(|s| status::status_line(&s)),
            Some("Rotation (x:3.00, y:0.00, z:0.00)".to_string())
        );

        viewport.teardown().unwrap();
        assert_eq!(viewport.phase(), Phase::TornDown);
        assert!(!viewport.host_mut().take_due());
        assert!(!viewport.host().resize_attached());
    }
}
