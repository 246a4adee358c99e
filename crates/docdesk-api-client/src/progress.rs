use bytes::Bytes;
use futures::stream;

use crate::store::ProgressFn;

const CHUNK_SIZE: usize = 64 * 1024;

/// Integer percentage of `sent` over `total`, rounded to nearest.
pub(crate) fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let value = (sent.min(total) * 100 + total / 2) / total;
    value as u8
}

/// Wrap an upload payload in a streaming body that reports how much of it
/// has been handed to the connection. Reports never decrease and the last
/// one is 100.
pub(crate) fn progress_body(data: Bytes, on_progress: ProgressFn) -> reqwest::Body {
    let total = data.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(total)))
        .collect();

    let mut sent: u64 = 0;
    let mut last_reported: Option<u8> = None;
    let stream = stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        let value = percent(sent, total as u64);
        if last_reported.map_or(true, |last| value > last) {
            last_reported = Some(value);
            on_progress(value);
        }
        Ok::<Bytes, std::io::Error>(chunk)
    }));

    reqwest::Body::wrap_stream(stream)
}
