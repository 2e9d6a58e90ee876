use std::{cell::RefCell, rc::Rc};

/// An in-memory output sink which can be handed to an interpreter and read
/// back afterwards through any of its clones.
#[derive(Debug, Clone, Default)]
pub struct CaptureOutput {
    into: Rc<RefCell<String>>,
}

impl CaptureOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.into.borrow().clone()
    }
}

impl std::io::Write for CaptureOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let s = std::str::from_utf8(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.into.borrow_mut().push_str(s);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Display for CaptureOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.into.borrow())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn clones_share_the_buffer() {
        let output = CaptureOutput::new();
        let mut writer = output.clone();

        writeln!(writer, "hello").expect("write to succeed");
        write!(writer, "world").expect("write to succeed");

        assert_eq!(output.contents(), "hello\nworld");
        assert_eq!(format!("{}", output), "hello\nworld");
    }
}
