use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::rc::Rc;

/// Memory-backed writer for capturing what the interpreter writes itself
/// (builtin output and diagnostics).
///
/// Spawned programs are not affected: they inherit the real standard streams.
#[derive(Debug, Default, Clone)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let mut writer = MemWriter::new();
        let reader = writer.clone();
        write!(writer, "a{}", 1).unwrap();
        writer.write_all(b"\n").unwrap();
        assert_eq!(writer.contents(), "a1\n");
        assert_eq!(reader.contents(), "a1\n");
    }
}
