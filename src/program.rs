//! The program loop: one thread consuming events, repainting inline after
//! each one, and farming background work out to task threads.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::event::{Cmd, Event, WinSize};
use crate::navigator::{Control, Navigator, View};
use crate::terminal::Terminal;
use crate::text::truncate_to_width;

const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

/// Handle for posting events into a running program. Cloneable and `Send`;
/// background tasks and tests use it to inject messages.
#[derive(Clone)]
pub struct EventSender(Sender<Event>);

impl EventSender {
    pub fn send(&self, event: Event) {
        // The loop dropping its receiver just means the program is shutting
        // down; late task results are fine to discard.
        let _ = self.0.send(event);
    }

    pub fn post(&self, msg: impl std::any::Any + Send) {
        self.send(Event::Message(Box::new(msg)));
    }
}

pub struct Program<T: Terminal> {
    terminal: T,
    navigator: Navigator,
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    painted_lines: usize,
}

impl<T: Terminal> Program<T> {
    pub fn new(terminal: T, root: Box<dyn View>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            terminal,
            navigator: Navigator::new(root),
            sender,
            receiver,
            painted_lines: 0,
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender(self.sender.clone())
    }

    /// Runs the loop until a view quits or the last view is popped.
    /// Restores the terminal before returning.
    pub fn run(&mut self) -> std::io::Result<()> {
        let input_sender = self.sender.clone();
        let resize_sender = self.sender.clone();
        self.terminal.start(
            Box::new(move |data| {
                let _ = input_sender.send(Event::Input(data));
            }),
            Box::new(move |columns, rows| {
                let _ = resize_sender.send(Event::Resize(WinSize {
                    width: columns as usize,
                    height: rows as usize,
                }));
            }),
        )?;
        self.terminal.write(HIDE_CURSOR);

        // Seed the size so the first frame lays out before any resize
        // arrives from the backend.
        let initial = WinSize {
            width: self.terminal.columns() as usize,
            height: self.terminal.rows() as usize,
        };
        let mut quit = false;
        match self.navigator.handle_event(&Event::Resize(initial)) {
            Control::Quit => quit = true,
            Control::Continue(Some(cmd)) => quit = !self.dispatch(cmd),
            Control::Continue(None) => {}
        }
        if !quit {
            if let Some(cmd) = self.navigator.init() {
                quit = !self.dispatch(cmd);
            }
        }
        if !quit {
            self.repaint();
        }

        while !quit {
            let Ok(event) = self.receiver.recv() else {
                break;
            };
            match self.navigator.handle_event(&event) {
                Control::Quit => quit = true,
                Control::Continue(cmd) => {
                    if let Some(cmd) = cmd {
                        quit = !self.dispatch(cmd);
                    }
                }
            }
            self.repaint();
        }

        self.terminal.write(SHOW_CURSOR);
        self.terminal.write("\r\n");
        self.terminal.stop()
    }

    /// Executes one command tree. Returns `false` when the program should
    /// quit.
    fn dispatch(&mut self, cmd: Cmd) -> bool {
        match cmd {
            Cmd::Nav(request) => match self.navigator.apply(request) {
                Control::Quit => false,
                Control::Continue(Some(cmd)) => self.dispatch(cmd),
                Control::Continue(None) => true,
            },
            Cmd::Task(work) => {
                let sender = self.sender.clone();
                thread::spawn(move || {
                    if let Some(msg) = work() {
                        let _ = sender.send(Event::Message(msg));
                    }
                });
                true
            }
            Cmd::Stream(work) => {
                let sender = self.sender();
                thread::spawn(move || work(sender));
                true
            }
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    if !self.dispatch(cmd) {
                        return false;
                    }
                }
                true
            }
            Cmd::Quit => false,
        }
    }

    /// Repaints in place: moves the cursor back to the top of the previous
    /// frame, clears to the end of the screen, and writes the new frame.
    fn repaint(&mut self) {
        let width = self.navigator.size().width;
        let frame = self.navigator.render();
        let lines: Vec<String> = frame
            .lines()
            .map(|line| truncate_to_width(line, width))
            .collect();

        let mut out = String::new();
        if self.painted_lines > 1 {
            out.push_str(&format!("\x1b[{}A", self.painted_lines - 1));
        }
        out.push_str("\r\x1b[J");
        out.push_str(&lines.join("\r\n"));
        self.painted_lines = lines.len().max(1);
        self.terminal.write(&out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeTerminal {
        written: Arc<Mutex<String>>,
        stopped: Arc<Mutex<bool>>,
    }

    impl Terminal for FakeTerminal {
        fn start(
            &mut self,
            _on_input: crate::terminal::InputHandler,
            _on_resize: crate::terminal::ResizeHandler,
        ) -> io::Result<()> {
            Ok(())
        }

        fn stop(&mut self) -> io::Result<()> {
            *self.stopped.lock().unwrap() = true;
            Ok(())
        }

        fn write(&mut self, data: &str) {
            self.written.lock().unwrap().push_str(data);
        }

        fn columns(&self) -> u16 {
            40
        }

        fn rows(&self) -> u16 {
            10
        }
    }

    struct Counter {
        count: usize,
    }

    struct Bump;

    impl View for Counter {
        fn render(&mut self, _size: WinSize) -> String {
            format!("count: {}", self.count)
        }

        fn handle_event(&mut self, event: &Event) -> Option<Cmd> {
            if event.message::<Bump>().is_some() {
                self.count += 1;
            }
            if let Event::Input(data) = event {
                if data == "q" {
                    return Some(Cmd::Quit);
                }
                if data == "t" {
                    return Some(Cmd::task(|| Some(Bump)));
                }
            }
            None
        }
    }

    #[test]
    fn run_paints_frames_and_restores_terminal() {
        let terminal = FakeTerminal::default();
        let written = Arc::clone(&terminal.written);
        let stopped = Arc::clone(&terminal.stopped);

        let mut program = Program::new(terminal, Box::new(Counter { count: 0 }));
        let sender = program.sender();
        sender.send(Event::Input("q".to_string()));
        program.run().expect("program run");

        let output = written.lock().unwrap();
        assert!(output.contains(HIDE_CURSOR));
        assert!(output.contains("count: 0"));
        assert!(output.contains(SHOW_CURSOR));
        assert!(*stopped.lock().unwrap());
    }

    #[test]
    fn task_results_come_back_as_messages() {
        let terminal = FakeTerminal::default();
        let written = Arc::clone(&terminal.written);

        let mut program = Program::new(terminal, Box::new(Counter { count: 0 }));
        let sender = program.sender();
        sender.send(Event::Input("t".to_string()));
        // The spawned task races the queued quit, so deliver one Bump
        // deterministically through the sender as well.
        sender.post(Bump);
        sender.send(Event::Input("q".to_string()));
        program.run().expect("program run");

        let output = written.lock().unwrap();
        assert!(output.contains("count: 1"));
    }

    #[test]
    fn ctrl_c_always_quits() {
        let terminal = FakeTerminal::default();
        let stopped = Arc::clone(&terminal.stopped);

        let mut program = Program::new(terminal, Box::new(Counter { count: 0 }));
        program.sender().send(Event::Input("\x03".to_string()));
        program.run().expect("program run");
        assert!(*stopped.lock().unwrap());
    }

    #[test]
    fn long_lines_are_clipped_to_the_viewport() {
        let terminal = FakeTerminal::default();
        let written = Arc::clone(&terminal.written);

        struct Wide;
        impl View for Wide {
            fn render(&mut self, _size: WinSize) -> String {
                "x".repeat(200)
            }
            fn handle_event(&mut self, _event: &Event) -> Option<Cmd> {
                None
            }
        }

        let mut program = Program::new(terminal, Box::new(Wide));
        program.sender().send(Event::Input("\x03".to_string()));
        program.run().expect("program run");

        let output = written.lock().unwrap();
        assert!(output.contains(&"x".repeat(40)));
        assert!(!output.contains(&"x".repeat(41)));
    }
}
