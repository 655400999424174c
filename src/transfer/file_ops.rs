//! Module `file_transfer`
//!
//! Streams directory listings and file contents over an established data
//! connection. Files are copied byte-for-byte through a bounded buffer with no
//! line-ending translation.

use log::info;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::storage::ListingEntry;

/// Formats one listing line: `<type> <size> <name>\r\n`, where the type is
/// `d` for directories and `-` otherwise and the size is right-justified.
pub fn format_listing_entry(entry: &ListingEntry) -> String {
    let kind = if entry.is_dir { 'd' } else { '-' };
    format!("{} {:>10} {}\r\n", kind, entry.size, entry.name)
}

/// Writes one line per entry to the data stream.
pub async fn send_listing<W>(data_stream: &mut W, entries: &[ListingEntry]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for entry in entries {
        data_stream
            .write_all(format_listing_entry(entry).as_bytes())
            .await?;
    }
    data_stream.flush().await
}

/// Copies a file to the data stream. Returns the number of bytes sent.
pub async fn handle_file_download<W>(
    data_stream: &mut W,
    file_path: &Path,
    buffer_size: usize,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut file = File::open(file_path).await?;
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total_bytes_sent = 0u64;

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        data_stream.write_all(&buffer[..n]).await?;
        total_bytes_sent += n as u64;
    }

    data_stream.flush().await?;

    info!(
        "File download completed: {} ({} bytes)",
        file_path.display(),
        total_bytes_sent
    );
    Ok(total_bytes_sent)
}
