//! Sequential chunked upload of a local file

use crate::error::Result;
use crate::logging::Logger;
use crate::registry::{ChunkPart, RegistryTransport, RepositoryRef, UploadSession};
use crate::upload::strategy::ChunkRange;
use std::io::SeekFrom;
use std::path::Path;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

pub struct ChunkedUploader<'a> {
    transport: &'a dyn RegistryTransport,
    output: Logger,
}

impl<'a> ChunkedUploader<'a> {
    pub fn new(transport: &'a dyn RegistryTransport, output: Logger) -> Self {
        Self { transport, output }
    }

    /// Send every range in order, then finalize the session.
    ///
    /// Chunk N+1 is read and sent only after chunk N was acknowledged. If a chunk
    /// or the finalization fails, the session is aborted and the original error
    /// returned.
    pub async fn upload(
        &self,
        repository: &RepositoryRef,
        session: &UploadSession,
        path: &Path,
        ranges: &[ChunkRange],
    ) -> Result<()> {
        let result = match self.send_chunks(session, path, ranges).await {
            Ok(()) => {
                self.output.detail("All chunks acknowledged, completing upload");
                self.transport.complete_upload(repository, session).await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.output
                .warning(&format!("Chunked upload failed, aborting session: {}", e));
            if let Err(abort_err) = self.transport.abort_upload(repository, session).await {
                self.output
                    .warning(&format!("Failed to abort upload session: {}", abort_err));
            }
        }
        result
    }

    async fn send_chunks(
        &self,
        session: &UploadSession,
        path: &Path,
        ranges: &[ChunkRange],
    ) -> Result<()> {
        let total = ranges.len() as u32;
        let mut file = tokio::fs::File::open(path).await?;

        for range in ranges {
            let data = Self::read_range(&mut file, range).await?;
            let part = ChunkPart {
                index: range.index,
                total,
            };

            let start_time = Instant::now();
            self.output.progress(&format!(
                "Uploading chunk {}/{} ({})",
                part.index,
                part.total,
                self.output.format_size(range.len)
            ));
            self.transport.upload_chunk(session, part, data).await?;
            self.output.progress_done();
            let elapsed = start_time.elapsed();
            self.output.detail(&format!(
                "Chunk {}/{} acknowledged in {} ({})",
                part.index,
                part.total,
                self.output.format_duration(elapsed),
                self.output.format_speed(range.len, elapsed)
            ));
        }

        Ok(())
    }

    async fn read_range(file: &mut tokio::fs::File, range: &ChunkRange) -> Result<Vec<u8>> {
        file.seek(SeekFrom::Start(range.offset)).await?;
        let mut data = vec![0u8; range.len as usize];
        file.read_exact(&mut data).await?;
        Ok(data)
    }
}
