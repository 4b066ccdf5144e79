use crate::rendering::kitty::KittyTransport;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, ExecutableCommand};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Once, OnceLock};
use std::thread::{self, ThreadId};

static PANIC_HOOK_SET: Once = Once::new();

/// Thread that owns the terminal. Panics elsewhere are contained by their
/// pool and must not tear the screen down.
static UI_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Whether inline images may be on screen and need deleting on exit
static GRAPHICS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Raw mode plus alternate screen for as long as it lives. Dropping it (or
/// panicking) deletes any inline images before the terminal is handed back.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new(graphics: bool) -> Result<Self, io::Error> {
        enable_raw_mode()?;
        io::stdout().execute(terminal::EnterAlternateScreen)?;
        io::stdout().execute(cursor::Hide)?;
        GRAPHICS_ACTIVE.store(graphics, Ordering::SeqCst);
        UI_THREAD.get_or_init(|| thread::current().id());

        set_panic_hook();

        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

fn restore() {
    let mut stdout = io::stdout();
    if GRAPHICS_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = KittyTransport::clear(&mut stdout);
    }
    let _ = stdout.execute(cursor::Show);
    let _ = stdout.execute(terminal::LeaveAlternateScreen);
    let _ = disable_raw_mode();
    let _ = stdout.flush();
}

fn set_panic_hook() {
    PANIC_HOOK_SET.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            if on_ui_thread() {
                restore();
            }
            previous(panic_info);
        }));
    });
}

fn on_ui_thread() -> bool {
    UI_THREAD
        .get()
        .map_or(true, |id| *id == thread::current().id())
}
