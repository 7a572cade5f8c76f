//! Tracing subscriber setup. The wasm build writes to the browser console.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(max_level: Level) {
    let builder = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_target(false);

    #[cfg(target_arch = "wasm32")]
    let result = builder
        .without_time()
        .with_ansi(false)
        .with_writer(ConsoleWriter::default)
        .try_init();

    #[cfg(not(target_arch = "wasm32"))]
    let result = builder.try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Buffers one formatted event and hands it to `console.log` on drop.
#[cfg(target_arch = "wasm32")]
#[derive(Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

#[cfg(target_arch = "wasm32")]
impl std::io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&line.trim_end().into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init(Level::DEBUG);
        init(Level::INFO);
        tracing::info!("logging ready");
    }
}
