//! AdapterFile trait for streaming file content
//!
//! Handles are returned by [`Adapter::open`](super::Adapter::open) and are
//! the only way content moves in and out of a backend. All access is
//! positional, so a handle never carries a cursor.

use std::io;

/// Open file handle of a backend adapter
///
/// # Examples
///
/// ```rust,ignore
/// let mut file = adapter.open("/data.bin", OpenFlags::write_truncate()).await?;
/// file.write_all_at(b"Hello, World!", 0).await?;
/// file.close().await?;
/// ```
pub trait AdapterFile: 'static {
    /// Read up to `len` bytes starting at `offset`
    ///
    /// # Returns
    ///
    /// The bytes read. An empty vector means end of file.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not readable or the read fails.
    async fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>>;

    /// Write `data` at `offset`
    ///
    /// # Returns
    ///
    /// The number of bytes actually written, which may be short.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not writable or the write fails.
    async fn write_at(&mut self, data: Vec<u8>, offset: u64) -> io::Result<usize>;

    /// Close the handle, flushing anything the backend buffered
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release the handle.
    async fn close(self) -> io::Result<()>
    where
        Self: Sized;

    // =========================================================================
    // Provided methods with default implementations
    // =========================================================================

    /// Write all of `data` at `offset`, retrying short writes
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails or makes no progress.
    async fn write_all_at(&mut self, data: &[u8], offset: u64) -> io::Result<()> {
        let mut written = 0usize;

        while written < data.len() {
            let bytes = self
                .write_at(data[written..].to_vec(), offset + written as u64)
                .await?;

            if bytes == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write data: no bytes written",
                ));
            }

            written += bytes;
        }

        Ok(())
    }

    /// Read the whole file in chunks of `chunk_size`
    ///
    /// # Errors
    ///
    /// Returns an error if any read fails.
    async fn read_to_end(&self, chunk_size: usize) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();

        loop {
            let chunk = self.read_at(content.len() as u64, chunk_size).await?;
            if chunk.is_empty() {
                return Ok(content);
            }
            content.extend_from_slice(&chunk);
        }
    }
}
