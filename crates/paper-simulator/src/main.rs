//! Desktop simulator for the paper-core e-paper compositor.
//!
//! Stands in for the panel, touch controller and power manager so the
//! compositor can be exercised without hardware. Every partial refresh is
//! unpacked from the 4-bit wire format into an SDL2 window via
//! `embedded-graphics-simulator`, so what you see is exactly what the panel
//! driver would receive.
//!
//! # Controls
//!
//! | Input        | Action              |
//! |--------------|---------------------|
//! | Mouse press  | Finger down         |
//! | Mouse release| Finger up (tap)     |
//! | Q / Escape   | Quit                |

use std::convert::Infallible;
use std::time::Duration as StdDuration;

use embassy_time::{Delay, Duration, Instant};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{debug, error, info, warn};

use paper_core::drivers::{AssetSource, DisplayDriver, PowerControl};
use paper_core::framebuffer::unpack_gray4;
use paper_core::input::{TOUCH_CHANNEL, TouchFilter, TouchSample, get_touch_sender};
use paper_core::ui::styling::{GREY, LIGHT_GREY};
use paper_core::ui::{
    Button, HAlign, Icon, Image, Label, Layer, ModalResult, NodeId, TextSize, VAlign,
};
use paper_core::{CompositorConfig, Manager, UiError};

// ---------------------------------------------------------------------------
// Simulator constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 1;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: StdDuration = StdDuration::from_millis(33);

/// Side length of the generated icon bitmap.
const ICON_SIZE: u32 = 64;

const QUOTES: [&str; 4] = [
    "Simplicity is prerequisite for reliability.",
    "The purpose of abstraction is not to be vague, but to create a new semantic level in which one can be absolutely precise.",
    "Premature optimization is the root of all evil.",
    "Programs must be written for people to read, and only incidentally for machines to execute.",
];

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Panel stand-in: unpacks every pushed window into the SDL framebuffer.
struct SimulatorPanel {
    display: SimulatorDisplay<Gray4>,
    pushes: u32,
}

impl DisplayDriver for SimulatorPanel {
    type Error = Infallible;

    fn push_rect(&mut self, area: Rectangle, packed: &[u8]) -> Result<(), Self::Error> {
        let pixels = (area.size.width * area.size.height) as usize;
        let mut unpacked = vec![0u8; pixels];
        unpack_gray4(packed, &mut unpacked);

        self.pushes += 1;
        debug!("Push #{}: {:?}", self.pushes, area);
        self.display
            .fill_contiguous(&area, unpacked.into_iter().map(Gray4::new))
    }
}

/// The desktop never sleeps; this only reports what the firmware would do.
struct SimulatorPower;

impl PowerControl for SimulatorPower {
    fn sleep_until_touch(&mut self, since_last_push: Option<Duration>) {
        if let Some(since) = since_last_push {
            debug!("Panel settled {} ms after the last push", since.as_millis());
        }
    }
}

/// Bitmaps generated on the fly instead of read from an SD card.
struct GeneratedAssets {
    screen: Size,
}

impl GeneratedAssets {
    fn pack(size: Size, luma: impl Fn(u32, u32) -> u8) -> Vec<u8> {
        let mut packed = vec![0u8; Image::expected_len(size)];
        for y in 0..size.height {
            for x in 0..size.width {
                let index = (y * size.width + x) as usize;
                let byte = &mut packed[index / 2];
                let value = luma(x, y) & 0x0F;
                if index % 2 == 0 {
                    *byte |= value << 4;
                } else {
                    *byte |= value;
                }
            }
        }
        packed
    }
}

impl AssetSource for GeneratedAssets {
    type Error = String;

    fn load(&mut self, name: &str) -> Result<Vec<u8>, Self::Error> {
        match name {
            // Soft vertical gradient, light enough to read text over
            "backdrop.raw" => {
                let height = self.screen.height;
                Ok(Self::pack(self.screen, |_, y| 15 - (y * 4 / height) as u8))
            }
            // Concentric diamonds
            "icon.raw" => {
                let half = ICON_SIZE as i32 / 2;
                Ok(Self::pack(Size::new(ICON_SIZE, ICON_SIZE), |x, y| {
                    let d = (x as i32 - half).abs() + (y as i32 - half).abs();
                    if (d / 6) % 2 == 0 { 0 } else { 15 }
                }))
            }
            other => Err(format!("no such asset: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Demo UI
// ---------------------------------------------------------------------------

/// Populate the screen; returns the status label that reports modal answers.
fn build_ui(manager: &mut Manager, assets: &mut GeneratedAssets) -> Result<NodeId, UiError> {
    let screen = manager.config().screen_bounds();
    let modal = manager.modal()?;

    manager.add(
        Image::from_asset(screen, assets, "backdrop.raw").with_layer(Layer::Background),
    )?;

    manager.add(
        Label::new(
            Rectangle::new(Point::new(20, 20), Size::new(500, 60)),
            "paper-rs simulator",
        )
        .with_font(TextSize::Large)
        .with_fill(LIGHT_GREY, 10),
    )?;

    let quote = manager.add(
        Label::new(
            Rectangle::new(Point::new(20, 120), Size::new(500, 300)),
            QUOTES[0],
        )
        .with_alignment(HAlign::Left, VAlign::Top),
    )?;

    let mut index = 0;
    manager.add(
        Button::new(Point::new(175, 460), "Next Quote").with_callback(move |tree, _, _| {
            index = (index + 1) % QUOTES.len();
            if let Some(label) = tree.label_mut(quote) {
                label.set_text(QUOTES[index]);
            }
            true
        }),
    )?;

    manager.add(
        Button::new(Point::new(60, 560), "Message").with_callback(move |tree, _, _| {
            tree.msgbox(modal, "About", "A retained-mode compositor for partial-refresh panels.")
                .is_ok()
        }),
    )?;

    manager.add(
        Button::new(Point::new(300, 560), "Confirm").with_callback(move |tree, _, _| {
            tree.confirm(modal, "Question", "Do you like this quote?").is_ok()
        }),
    )?;

    let icon = assets.load("icon.raw").unwrap_or_else(|e| {
        warn!("{}", e);
        Vec::new()
    });
    manager.add_icon(
        Rectangle::new(
            Point::new(238, 680),
            Size::new(ICON_SIZE, ICON_SIZE + Icon::caption_height()),
        ),
        icon,
        "Blink",
        move |tree, _, _| {
            if let Some(label) = tree.label_mut(quote) {
                label.set_text_colour(GREY);
            }
            true
        },
    )?;

    manager.add(
        Label::new(
            Rectangle::new(Point::new(20, 880), Size::new(500, 50)),
            "Last answer: none",
        )
        .with_font(TextSize::Small),
    )
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), UiError> {
    env_logger::init();
    info!("Starting paper-rs simulator");

    let config = CompositorConfig::default();
    let screen = config.screen_bounds();
    info!(
        "Display: {}×{} (scale {}×)",
        screen.size.width, screen.size.height, WINDOW_SCALE
    );
    info!("Click to tap, Q=Quit");

    let mut manager = Manager::new(config.clone())?;
    let mut assets = GeneratedAssets {
        screen: screen.size,
    };
    let status = build_ui(&mut manager, &mut assets)?;

    let mut panel = SimulatorPanel {
        display: SimulatorDisplay::new(screen.size),
        pushes: 0,
    };
    let mut delay = Delay;
    let mut power = SimulatorPower;
    let mut filter = TouchFilter::new(config.debounce());
    let touch = get_touch_sender();

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Paper Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    if let Err(e) = manager.update_display(&mut panel, &mut delay, Instant::now()) {
        error!("Initial push failed: {:?}", e);
    }
    window.update(&panel.display);

    let mut last_result = manager.modal_result();

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = std::time::Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            let sample = match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => {
                    if keycode == Keycode::Q || keycode == Keycode::Escape {
                        break 'running;
                    }
                    continue;
                }
                SimulatorEvent::MouseButtonDown { point, .. } => {
                    TouchSample::down(point.x.max(0) as u16, point.y.max(0) as u16)
                }
                SimulatorEvent::MouseButtonUp { point, .. } => {
                    TouchSample::up(point.x.max(0) as u16, point.y.max(0) as u16)
                }
                _ => continue,
            };
            if touch.try_send(sample).is_err() {
                warn!("Touch queue full, dropping {:?}", sample);
            }
        }

        // --- Touch dispatch -----------------------------------------------
        match manager.pump_touch(&TOUCH_CHANNEL, &mut filter, &mut panel, &mut delay, Instant::now())
        {
            Ok(0) => {}
            Ok(taps) => {
                debug!("Delivered {} tap(s)", taps);
                manager.sleep_until_touch(&mut power, &mut delay, Instant::now());
            }
            Err(e) => error!("Push failed: {:?}", e),
        }

        // --- Modal answers ------------------------------------------------
        let result = manager.modal_result();
        if result != last_result {
            last_result = result;
            if let Some(label) = manager.tree_mut().label_mut(status) {
                label.set_text(match result {
                    Some(ModalResult::Accepted) => "Last answer: OK",
                    Some(ModalResult::Rejected) => "Last answer: Cancel",
                    _ => "Last answer: pending",
                });
            }
            if let Err(e) = manager.update_display(&mut panel, &mut delay, Instant::now()) {
                error!("Push failed: {:?}", e);
            }
        }

        window.update(&panel.display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting after {} pushes", panel.pushes);
    Ok(())
}
