//! Text documents serialized by libclang (module maps, VFS overlays).

use crate::error::Result;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

/// An object libclang can render to a UTF-8 byte stream.
///
/// The bytes are passed through unchanged; where they go is up to the caller.
pub trait NativeDocument {
    /// Render the document. A zero-length result is valid.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// `Display` body shared by documents: the rendered text, or nothing if the
/// document cannot be rendered.
pub(crate) fn display(document: &impl NativeDocument, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match document.to_bytes() {
        Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
        Err(_) => Ok(()),
    }
}
