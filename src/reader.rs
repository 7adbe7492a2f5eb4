use std::io::{self, Read};

use crate::context::Globals;
use crate::renderer::Renderer;
use crate::store::TagStore;

/// A reader wrapper that yields the rendered contents of its input.
///
/// The whole input is read and rendered on the first `read` call. Errors from
/// the inner reader pass through unchanged; render failures surface as
/// [`io::ErrorKind::InvalidData`] wrapping the [`crate::TagupError`]. Once
/// either happens, every later `read` fails with the same kind.
pub struct RenderingReader<'r, R: Read, S> {
    inner: R,
    renderer: &'r Renderer<S>,
    globals: Option<&'r Globals>,
    buffer: Vec<u8>,
    buffer_pos: usize,
    done: bool,
    failed: Option<io::ErrorKind>,
}

impl<'r, R: Read, S: TagStore> RenderingReader<'r, R, S> {
    pub fn new(inner: R, renderer: &'r Renderer<S>, globals: Option<&'r Globals>) -> Self {
        Self {
            inner,
            renderer,
            globals,
            buffer: Vec::new(),
            buffer_pos: 0,
            done: false,
            failed: None,
        }
    }

    fn fill_buffer(&mut self) -> io::Result<()> {
        if let Some(kind) = self.failed {
            return Err(io::Error::new(kind, "input already failed to render"));
        }
        if self.done {
            return Ok(());
        }

        match self.render_input() {
            Ok(rendered) => {
                self.buffer = rendered.into_bytes();
                self.buffer_pos = 0;
                self.done = true;
                Ok(())
            }
            Err(err) => {
                self.failed = Some(err.kind());
                Err(err)
            }
        }
    }

    fn render_input(&mut self) -> io::Result<String> {
        // Invalid UTF-8 already comes back as InvalidData.
        let mut input = String::new();
        self.inner.read_to_string(&mut input)?;

        self.renderer
            .render(&input, self.globals)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read, S: TagStore> Read for RenderingReader<'_, R, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.done {
            self.fill_buffer()?;
        }

        if self.buffer_pos >= self.buffer.len() {
            return Ok(0);
        }

        let available = self.buffer.len() - self.buffer_pos;
        let to_copy = available.min(buf.len());
        buf[..to_copy].copy_from_slice(&self.buffer[self.buffer_pos..self.buffer_pos + to_copy]);
        self.buffer_pos += to_copy;

        Ok(to_copy)
    }
}
