use crate::app::{key_to_event, App, AppMode};
use crate::rendering::viewport::DisplayRegion;
use crate::storage::HistoryStore;
use crate::ui::preview::{self, GraphicsContext, ImagePlacement, PreviewPlan};
use crate::ui::render::{
    preview_block, render_caption, render_empty_history, render_history_list,
    render_preview_text, render_status_line,
};
use crate::ui::terminal_guard::TerminalGuard;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::ListState,
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Preview contents for one item at one list revision
struct PlannedPreview {
    id: String,
    revision: u64,
    plan: PreviewPlan,
}

pub struct TuiManager {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    graphics: GraphicsContext,
    preview: Option<PlannedPreview>,
    placement: ImagePlacement,
    _guard: TerminalGuard,
}

impl TuiManager {
    pub fn new(graphics: GraphicsContext) -> Result<Self, io::Error> {
        let guard = TerminalGuard::new(graphics.supports_graphics())?;

        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;

        Ok(TuiManager {
            terminal,
            graphics,
            preview: None,
            placement: ImagePlacement::new(),
            _guard: guard,
        })
    }

    pub fn run_event_loop<S: HistoryStore + 'static>(&mut self, app: &mut App<S>) -> io::Result<()> {
        loop {
            if app.mode() == AppMode::Quit {
                self.clear_images();
                return Ok(());
            }
            if app.take_clear_request() {
                self.clear_images();
            }

            self.refresh_preview(app);
            let image_region = self.render_frame(app)?;
            if let Some(region) = image_region {
                self.place_image(app, region);
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_event(key_to_event(app.mode(), key.code));
                }
                Event::Resize(cols, rows) => {
                    debug!(cols, rows, "Terminal resized");
                    self.clear_images();
                }
                _ => {}
            }
        }
    }

    /// Send the delete-all frame if an image may be on screen
    fn clear_images(&mut self) {
        if let Err(e) = self.placement.clear(&mut io::stdout()) {
            warn!(error = %e, "Failed to delete inline images");
        }
        self.preview = None;
    }

    /// Rebuild the preview plan when the selection or the list changed
    fn refresh_preview<S: HistoryStore + 'static>(&mut self, app: &App<S>) {
        if app.mode() != AppMode::Preview {
            self.preview = None;
            return;
        }
        let Some(item) = app.current() else {
            self.preview = None;
            return;
        };
        let stale = self
            .preview
            .as_ref()
            .map_or(true, |p| p.id != item.id || p.revision != app.revision());
        if stale {
            let plan = preview::plan_preview(&self.graphics, app.cache(), app.store(), item, app.cursor());
            self.preview = Some(PlannedPreview {
                id: item.id.clone(),
                revision: app.revision(),
                plan,
            });
        }
    }

    /// Draw the current view. Returns the region reserved for an inline image.
    pub fn render_frame<S: HistoryStore + 'static>(
        &mut self,
        app: &App<S>,
    ) -> io::Result<Option<DisplayRegion>> {
        let mut image_region = None;
        let preview = self.preview.as_ref();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(area);

            match (app.mode(), preview) {
                (AppMode::Preview, Some(preview)) => {
                    image_region = draw_preview(frame, chunks[0], preview);
                }
                _ => draw_list(frame, chunks[0], app),
            }

            let status = render_status_line(app.mode(), app.status(), (app.cursor(), app.items().len()));
            frame.render_widget(status, chunks[1]);
        })?;

        Ok(image_region)
    }

    /// Transmit the previewed image unless it is already shown in `region`
    fn place_image<S: HistoryStore + 'static>(&mut self, app: &mut App<S>, region: DisplayRegion) {
        let Some(PlannedPreview {
            id,
            plan: PreviewPlan::Image { asset, .. },
            ..
        }) = &self.preview
        else {
            return;
        };

        if let Err(e) = self
            .placement
            .show(&self.graphics, &mut io::stdout(), id, asset, region)
        {
            warn!(error = %e, %id, "Image transmission failed");
            app.set_status(format!("Could not display image: {e}"));
        }
    }
}

fn draw_list<S: HistoryStore + 'static>(frame: &mut Frame, area: Rect, app: &App<S>) {
    if app.items().is_empty() {
        frame.render_widget(render_empty_history(), area);
        return;
    }
    let mut state = ListState::default().with_selected(Some(app.cursor()));
    frame.render_stateful_widget(render_history_list(app.items()), area, &mut state);
}

fn draw_preview(frame: &mut Frame, area: Rect, preview: &PlannedPreview) -> Option<DisplayRegion> {
    let block = preview_block(&preview.id);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &preview.plan {
        PreviewPlan::Text(text) => {
            frame.render_widget(render_preview_text(text), inner);
            None
        }
        PreviewPlan::Image { caption, .. } => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(inner);
            frame.render_widget(render_caption(caption), parts[1]);
            Some(DisplayRegion::from(parts[0]))
        }
    }
}
