//! Per-stream line capture used by the process runner

use std::io::{ErrorKind, Read};
use std::sync::atomic::AtomicBool;

use log::Level;

use crate::logging::Logger;

const CHUNK_SIZE: usize = 8192;

/// Splits raw output into lines, aggregating and logging each one
///
/// Lines keep their endings in the aggregate and lose them in the log.
/// Invalid UTF-8 is replaced rather than aborting the capture.
pub(super) struct LineCapture<'a> {
    logger: &'a Logger,
    level: Option<Level>,
    pending: Vec<u8>,
    aggregate: String,
}

impl<'a> LineCapture<'a> {
    pub(super) fn new(logger: &'a Logger, level: Option<Level>) -> Self {
        Self {
            logger,
            level,
            pending: Vec::new(),
            aggregate: String::new(),
        }
    }

    pub(super) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            self.emit(&line);
        }
    }

    /// Flush an unterminated last line and return the aggregate
    pub(super) fn finish(mut self) -> String {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest);
        }
        self.aggregate
    }

    fn emit(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        self.aggregate.push_str(&text);
        self.logger
            .log_at(self.level, text.trim_end_matches(['\r', '\n']));
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use std::os::fd::AsFd;
        use std::sync::atomic::Ordering;

        use nix::errno::Errno;
        use nix::poll::{PollFd, PollFlags, poll};

        /// How long a reader waits for data before rechecking the child
        const POLL_INTERVAL_MS: u16 = 50;

        /// Read `stream` until EOF, or until it goes quiet after `exited` is set
        ///
        /// A background process started by the child can inherit the pipe and
        /// keep it open long after the child is gone; such output is not waited
        /// for. Everything the child wrote before exiting is already in the pipe
        /// when `exited` flips, so it is still collected.
        pub(super) fn drain<S: Read + AsFd>(
            stream: Option<S>,
            logger: &Logger,
            level: Option<Level>,
            exited: &AtomicBool,
        ) -> String {
            let mut capture = LineCapture::new(logger, level);
            let Some(mut stream) = stream else {
                return capture.finish();
            };

            let mut buf = [0u8; CHUNK_SIZE];
            loop {
                // Sampled before polling so a timeout can only mean "nothing left".
                let child_gone = exited.load(Ordering::Acquire);
                let ready = {
                    let mut fds = [PollFd::new(stream.as_fd(), PollFlags::POLLIN)];
                    poll(&mut fds, POLL_INTERVAL_MS)
                };
                match ready {
                    Ok(0) if child_gone => break,
                    Ok(0) | Err(Errno::EINTR) => continue,
                    Ok(_) => {}
                    Err(e) => {
                        logger.debug(format!("Stopped polling child output: {e}"));
                        break;
                    }
                }

                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => capture.push(&buf[..n]),
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        logger.debug(format!("Stopped reading child output: {e}"));
                        break;
                    }
                }
            }
            capture.finish()
        }
    } else {
        /// Read `stream` until EOF
        pub(super) fn drain<S: Read>(
            stream: Option<S>,
            logger: &Logger,
            level: Option<Level>,
            _exited: &AtomicBool,
        ) -> String {
            let mut capture = LineCapture::new(logger, level);
            let Some(mut stream) = stream else {
                return capture.finish();
            };

            let mut buf = [0u8; CHUNK_SIZE];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => capture.push(&buf[..n]),
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        logger.debug(format!("Stopped reading child output: {e}"));
                        break;
                    }
                }
            }
            capture.finish()
        }
    }
}
