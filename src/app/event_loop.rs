use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model};
use crate::pairing::Scanner;
use crate::relay::{RelayClient, RelayLink};

/// Longest wait for terminal input; relay and scanner are polled in between.
const IDLE_POLL: Duration = Duration::from_millis(50);

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Connect to the relay and run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay client cannot start, the terminal
    /// cannot be initialized, or the event loop hits an I/O failure.
    pub fn run(&self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let mut link = RelayClient::spawn(self.relay.clone())
            .with_context(|| format!("Failed to start relay client for {}", self.relay.url))?;

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal: notemirror requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let mut model = self.initial_model((size.width, size.height));
        crate::perf::log_event(
            "init.model",
            format!(
                "terminal={}x{} variant={} capability={:?}",
                size.width,
                size.height,
                model.note.variant().as_str(),
                model.capability,
            ),
        );

        let result = execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)
            .map_err(anyhow::Error::from)
            .and_then(|()| self.event_loop(&mut terminal, &mut model, &mut link));

        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    fn event_loop(
        &self,
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        link: &mut dyn RelayLink,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut scanner: Option<Scanner> = None;
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                self.dispatch(model, link, Message::Resize(width, height));
                needs_render = true;
            }

            while let Some(event) = link.poll_event() {
                self.dispatch(model, link, Message::from(event));
                needs_render = true;
            }

            Self::sync_scanner(model, &mut scanner);
            if let Some(payload) = scanner.as_mut().and_then(Scanner::poll) {
                // First non-empty code wins; the scanner closes with the region.
                scanner = None;
                self.dispatch(model, link, Message::ScanDecoded(payload));
                needs_render = true;
            }

            let poll = if needs_render {
                Duration::ZERO
            } else if resize_debouncer.is_pending() {
                Duration::from_millis(10)
            } else {
                IDLE_POLL
            };
            if event::poll(poll)? {
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if let Some(msg) =
                    Self::handle_event(event::read()?, model, event_ms, &mut resize_debouncer)
                {
                    self.dispatch(model, link, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::ZERO)? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    if let Some(msg) =
                        Self::handle_event(event::read()?, model, drain_ms, &mut resize_debouncer)
                    {
                        drained += 1;
                        self.dispatch(model, link, msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
