use crossterm::{
    cursor, execute,
    style::ResetColor,
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};
use std::panic;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

pub fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let raw_mode_result = terminal::disable_raw_mode();
        let mut stdout = io::stdout();
        let cleanup_result = execute!(stdout, ResetColor, cursor::Show, LeaveAlternateScreen);
        if raw_mode_result.is_err() || cleanup_result.is_err() {
            let mut stderr = io::stderr();
            let _ = writeln!(
                stderr,
                "panic cleanup fallback: writing terminal reset escape sequences"
            );
            let _ = stderr.write_all(b"\x1b[?1049l\x1b[?25h\x1b[0m");
            let _ = stderr.flush();
        }
        default_hook(panic_info);
    }));
}

/// Raw mode, alternate screen, hidden cursor.
pub fn enter_terminal(stdout: &mut impl Write) -> AppResult<()> {
    terminal::enable_raw_mode()?;
    execute!(
        stdout,
        EnterAlternateScreen,
        cursor::Hide,
        terminal::Clear(ClearType::All)
    )?;
    stdout.flush()?;
    Ok(())
}

/// Undoes `enter_terminal`. Every step is attempted even if an earlier
/// one fails; the first failure is returned.
pub fn cleanup_terminal(stdout: &mut impl Write) -> AppResult<()> {
    let screen_result = execute!(stdout, ResetColor, cursor::Show, LeaveAlternateScreen)
        .and_then(|()| stdout.flush());
    let raw_result = terminal::disable_raw_mode();
    screen_result?;
    raw_result?;
    Ok(())
}

/// Restores the terminal when dropped, so early returns cannot skip it.
pub struct TerminalGuard<W: Write> {
    stdout: W,
    restored: bool,
}

impl<W: Write> TerminalGuard<W> {
    pub fn enter(mut stdout: W) -> AppResult<Self> {
        if let Err(err) = enter_terminal(&mut stdout) {
            let _ = cleanup_terminal(&mut stdout);
            return Err(err);
        }
        Ok(Self {
            stdout,
            restored: false,
        })
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.stdout
    }

    pub fn restore(mut self) -> AppResult<()> {
        self.restored = true;
        cleanup_terminal(&mut self.stdout)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if !self.restored {
            let _ = cleanup_terminal(&mut self.stdout);
        }
    }
}
