//! HttpDownloadManager: the transfer subsystem used by the binary.
//!
//! Every enqueued url gets its own tokio task that streams the response
//! body to disk. Progress lives in a shared status table that
//! `query_status` reads; the manager never pushes events on its own.

use crate::core::config::{CONNECT_TIMEOUT, WRITE_BUFFER_SIZE};
use crate::core::error::SubsystemError;
use crate::core::subsystem::{EnqueueOptions, StatusSample, TransferStatus, TransferSubsystem};
use crate::core::transfer::TransferHandle;
use crate::utils::sos::SignalOfStop;
use futures_util::StreamExt;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct DownloadRecord {
    status: TransferStatus,
    total_bytes: Option<u64>,
    downloaded_bytes: u64,
    destination: PathBuf,
    cancel: SignalOfStop,
}

type StatusTable = Arc<Mutex<HashMap<TransferHandle, DownloadRecord>>>;

pub struct HttpDownloadManager {
    client: Client,
    download_dir: PathBuf,
    records: StatusTable,
    next_id: AtomicU64,
}

impl HttpDownloadManager {
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self, SubsystemError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            download_dir: download_dir.into(),
            records: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        })
    }

    fn destination_for(&self, handle: TransferHandle, url: &Url) -> PathBuf {
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("download");
        self.download_dir
            .join(format!("fetchdrop-{}-{}", handle.0, name))
    }
}

impl TransferSubsystem for HttpDownloadManager {
    fn enqueue(
        &self,
        url: &str,
        options: &EnqueueOptions,
    ) -> Result<TransferHandle, SubsystemError> {
        let parsed = Url::parse(url).map_err(|e| SubsystemError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SubsystemError::Unavailable(e.to_string()))?;

        let handle = TransferHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let destination = self.destination_for(handle, &parsed);
        let cancel = SignalOfStop::new();

        {
            let mut records = self
                .records
                .lock()
                .map_err(|_| SubsystemError::Unavailable("status table poisoned".to_string()))?;
            records.insert(
                handle,
                DownloadRecord {
                    status: TransferStatus::Pending,
                    total_bytes: None,
                    downloaded_bytes: 0,
                    destination: destination.clone(),
                    cancel: cancel.clone(),
                },
            );
        }

        info!(
            event = "download_enqueued",
            handle = %handle,
            url = %parsed,
            title = %options.title,
            description = %options.description,
            allow_metered = options.allow_metered,
            allow_roaming = options.allow_roaming,
            requires_charging = options.requires_charging,
            destination = %destination.display(),
        );

        runtime.spawn(run_download(
            self.client.clone(),
            parsed,
            destination,
            Arc::clone(&self.records),
            handle,
            cancel,
        ));

        Ok(handle)
    }

    fn query_status(&self, handle: TransferHandle) -> Result<StatusSample, SubsystemError> {
        let records = self
            .records
            .lock()
            .map_err(|_| SubsystemError::Unavailable("status table poisoned".to_string()))?;
        Ok(match records.get(&handle) {
            Some(record) => StatusSample {
                status: record.status,
                total_bytes: record.total_bytes,
                downloaded_bytes: Some(record.downloaded_bytes),
            },
            None => StatusSample::of(TransferStatus::Unknown),
        })
    }

    fn remove(&self, handle: TransferHandle) {
        let record = match self.records.lock() {
            Ok(mut records) => records.remove(&handle),
            Err(_) => return,
        };
        let Some(record) = record else {
            return;
        };
        record.cancel.cancel();

        // The download task may never run again (runtime shutdown), so an
        // unfinished file is deleted here as well.
        if record.status != TransferStatus::Successful {
            match std::fs::remove_file(&record.destination) {
                Ok(()) => debug!(
                    event = "partial_file_removed",
                    handle = %handle,
                    path = %record.destination.display(),
                ),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    event = "partial_file_remove_failed",
                    handle = %handle,
                    path = %record.destination.display(),
                    error = %e,
                ),
            }
        }
        debug!(event = "download_removed", handle = %handle);
    }
}

fn update_record(records: &StatusTable, handle: TransferHandle, f: impl FnOnce(&mut DownloadRecord)) {
    if let Ok(mut records) = records.lock()
        && let Some(record) = records.get_mut(&handle)
    {
        f(record);
    }
}

async fn run_download(
    client: Client,
    url: Url,
    destination: PathBuf,
    records: StatusTable,
    handle: TransferHandle,
    cancel: SignalOfStop,
) {
    match stream_to_file(&client, url, &destination, &records, handle, &cancel).await {
        Ok(true) => {
            info!(event = "download_complete", handle = %handle, path = %destination.display());
            update_record(&records, handle, |r| r.status = TransferStatus::Successful);
        }
        Ok(false) => {
            debug!(event = "download_cancelled", handle = %handle);
            let _ = tokio::fs::remove_file(&destination).await;
        }
        Err(e) => {
            warn!(event = "download_failed", handle = %handle, error = %e);
            let _ = tokio::fs::remove_file(&destination).await;
            update_record(&records, handle, |r| r.status = TransferStatus::Failed);
        }
    }
}

/// Returns `Ok(false)` when the download was cancelled midway.
async fn stream_to_file(
    client: &Client,
    url: Url,
    destination: &Path,
    records: &StatusTable,
    handle: TransferHandle,
    cancel: &SignalOfStop,
) -> Result<bool, SubsystemError> {
    let response = tokio::select! {
        biased;
        _ = cancel.wait() => return Ok(false),
        response = client.get(url).send() => response?.error_for_status()?,
    };
    let total = response.content_length();
    update_record(records, handle, |r| {
        r.status = TransferStatus::Running;
        r.total_bytes = total;
    });

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = File::create(destination).await?;
    let mut write_buffer = Vec::with_capacity(WRITE_BUFFER_SIZE);
    let mut downloaded = 0u64;

    let mut stream = response.bytes_stream();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.wait() => return Ok(false),
            chunk = stream.next() => chunk,
        };
        let Some(chunk) = chunk else {
            break;
        };
        let chunk = chunk?;
        downloaded += chunk.len() as u64;
        write_buffer.extend_from_slice(&chunk);
        if write_buffer.len() >= WRITE_BUFFER_SIZE {
            file.write_all(&write_buffer).await?;
            write_buffer.clear();
        }
        update_record(records, handle, |r| r.downloaded_bytes = downloaded);
    }

    if !write_buffer.is_empty() {
        file.write_all(&write_buffer).await?;
    }
    file.flush().await?;
    Ok(!cancel.cancelled())
}
