//! Terminal backend abstraction and the Unix process implementation.
//!
//! `ProcessTerminal` owns raw mode and two background threads: one polling
//! stdin for input sequences, one waiting on SIGWINCH and reporting the new
//! window size. Both report through callbacks installed at `start`.

use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Callback for raw input sequences (one key press or escape sequence per
/// call).
pub type InputHandler = Box<dyn FnMut(String) + Send>;

/// Callback for window size changes, invoked with `(columns, rows)`.
pub type ResizeHandler = Box<dyn FnMut(u16, u16) + Send>;

/// Low-level terminal I/O. The event loop drives a `Terminal` and never
/// touches file descriptors itself, which keeps the loop testable with an
/// in-memory implementation.
pub trait Terminal {
    fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> io::Result<()>;
    fn stop(&mut self) -> io::Result<()>;
    fn write(&mut self, data: &str);
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & libc::POLLIN) != 0
}

#[cfg(unix)]
fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result > 0 && (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
    }
}

/// Writes the whole buffer, retrying on EINTR and polling on EAGAIN.
#[cfg(unix)]
fn write_all_fd(fd: c_int, data: &str) -> io::Result<()> {
    let bytes = data.as_bytes();
    let mut written = 0;
    while written < bytes.len() {
        let remaining = &bytes[written..];
        let result =
            unsafe { libc::write(fd, remaining.as_ptr() as *const libc::c_void, remaining.len()) };
        if result > 0 {
            written += result as usize;
            continue;
        }
        if result == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
        }
        let err = io::Error::last_os_error();
        match err.kind() {
            io::ErrorKind::Interrupted => continue,
            io::ErrorKind::WouldBlock => wait_writable(fd)?,
            _ => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    input_handler: Arc<Mutex<Option<InputHandler>>>,
    resize_handler: Arc<Mutex<Option<ResizeHandler>>>,
    stop_flag: Arc<AtomicBool>,
    input_thread: Option<JoinHandle<()>>,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            input_handler: Arc::new(Mutex::new(None)),
            resize_handler: Arc::new(Mutex::new(None)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            input_thread: None,
            resize_signal_handle: None,
            resize_thread: None,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.original_termios {
            Some(termios) => termios,
            None => {
                let termios = get_termios(self.stdin_fd)?;
                self.original_termios = Some(termios);
                termios
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn start_input_thread(&mut self) {
        let stdin_fd = self.stdin_fd;
        let handler = Arc::clone(&self.input_handler);
        let stop_flag = Arc::clone(&self.stop_flag);

        self.input_thread = Some(thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            while !stop_flag.load(Ordering::SeqCst) {
                if !poll_readable(stdin_fd, 50) {
                    continue;
                }
                let read_len =
                    unsafe { libc::read(stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len()) };
                if read_len <= 0 {
                    continue;
                }
                let mut bytes = buffer[..read_len as usize].to_vec();
                // A lone ESC may be the start of a sequence split across
                // reads; give the rest of the sequence a moment to arrive.
                if bytes == [0x1b] && poll_readable(stdin_fd, 10) {
                    let more = unsafe {
                        libc::read(stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len())
                    };
                    if more > 0 {
                        bytes.extend_from_slice(&buffer[..more as usize]);
                    }
                }
                let data = String::from_utf8_lossy(&bytes).into_owned();
                let mut guard = handler.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(handler) = guard.as_mut() {
                    handler(data);
                }
            }
        }));
    }

    fn start_resize_thread(&mut self) {
        let mut signals = Signals::new([libc::SIGWINCH]).expect("failed to register SIGWINCH");
        let handle = signals.handle();
        let stdout_fd = self.stdout_fd;
        let resize_handler = Arc::clone(&self.resize_handler);

        self.resize_thread = Some(thread::spawn(move || {
            for _ in signals.forever() {
                let Some((columns, rows)) = read_winsize(stdout_fd) else {
                    continue;
                };
                let mut guard = resize_handler.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(handler) = guard.as_mut() {
                    handler(columns, rows);
                }
            }
        }));
        self.resize_signal_handle = Some(handle);
    }

    fn stop_threads(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(handle) = self.resize_thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> io::Result<()> {
        *self.input_handler.lock().unwrap_or_else(|e| e.into_inner()) = Some(on_input);
        *self
            .resize_handler
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(on_resize);
        self.stop_flag.store(false, Ordering::SeqCst);

        if let Err(err) = self.enable_raw_mode() {
            *self.input_handler.lock().unwrap_or_else(|e| e.into_inner()) = None;
            *self
                .resize_handler
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = None;
            return Err(err);
        }

        self.start_resize_thread();
        // Deliver the initial size through the same path as real resizes.
        unsafe {
            libc::raise(libc::SIGWINCH);
        }
        self.start_input_thread();
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        self.stop_threads();
        *self.input_handler.lock().unwrap_or_else(|e| e.into_inner()) = None;
        *self
            .resize_handler
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;

        // Flush pending input before leaving raw mode so stray key presses
        // do not leak into the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };
        self.restore_raw_mode()
    }

    fn write(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        if let Err(err) = write_all_fd(self.stdout_fd, data) {
            tracing::error!(%err, "terminal write failed");
        }
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(columns, _)| columns)
            .unwrap_or(80)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(24)
    }
}

/// Best-effort terminal restoration for panics while raw mode is active.
///
/// Installs a panic hook that runs `cleanup` once before delegating to the
/// previously installed hook.
#[cfg(unix)]
pub fn install_panic_cleanup<F>(cleanup: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let ran = AtomicBool::new(false);
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if !ran.swap(true, Ordering::SeqCst) {
            cleanup();
        }
        previous(info);
    }));
}
