use crate::error::{Result, SolcError};
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

pub const USER_AGENT: &str = concat!("solc-select/", env!("CARGO_PKG_VERSION"));

/// Upper bound on how much of an advertised `Content-Length` is reserved up front.
const MAX_PREALLOCATION: u64 = 64 << 20;

pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Issue a GET and fail on any non-2xx status.
pub async fn send_get(
    client: &reqwest::Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<reqwest::Response> {
    tracing::debug!("GET {}", url);

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SolcError::Cancelled),
        response = client.get(url).send() => response?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(SolcError::UnexpectedStatusCode {
            status,
            url: url.to_string(),
        });
    }

    Ok(response)
}

/// Download a whole body into memory, reporting progress on `progress` when given.
pub async fn download_bytes(
    client: &reqwest::Client,
    url: &str,
    label: &str,
    progress: Option<&MultiProgress>,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let response = send_get(client, url, cancel).await?;
    let total_size = response.content_length().unwrap_or(0);

    let pb = match progress {
        Some(multi) => multi.add(ProgressBar::new(total_size)),
        None => ProgressBar::hidden(),
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {}", label));

    let mut data = Vec::with_capacity(total_size.min(MAX_PREALLOCATION) as usize);
    let mut stream = response.bytes_stream();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                pb.abandon_with_message(format!("Cancelled {}", label));
                return Err(SolcError::Cancelled);
            }
            chunk = stream.next() => chunk,
        };
        match chunk {
            Some(chunk) => {
                let chunk = chunk?;
                data.extend_from_slice(&chunk);
                pb.set_position(data.len() as u64);
            }
            None => break,
        }
    }

    pb.finish_and_clear();
    tracing::debug!("Downloaded {} bytes from {}", data.len(), url);
    Ok(data)
}

/// Unpack an in-memory zip archive into `extract_dir`.
pub fn extract_zip(data: &[u8], extract_dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(name) => extract_dir.join(name),
            None => {
                tracing::warn!("Skipping malicious path in zip: {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}

/// Locate `file_name` under `dir`, preferring the shallowest match.
pub fn find_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(file_name))
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

pub fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o775);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
