//! Service worker manifest generation
//!
//! After a clone the output tree is listed and `sw.js` is written at its root. The
//! worker precaches every file on install, claims open clients on activate, and
//! answers fetches from the cache with `/index.html` as the fallback.

use crate::output::writer::{is_temp_file, write_atomic};
use crate::url::encode_link_path;
use crate::Result;
use jwalk::WalkDir;
use std::path::Path;

/// Filename of the generated service worker
pub const SERVICE_WORKER_FILE: &str = "sw.js";

/// Name of the cache the worker fills
pub const CACHE_NAME: &str = "siteclone-precache-v1";

/// Returns the sorted root-relative paths (`/index.html`, ...) of every file under `root`
///
/// `sw.js` and leftover temporary files are excluded.
pub fn list_precache_paths(root: &Path) -> Result<Vec<String>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).skip_hidden(false).follow_links(false) {
        let entry = entry.map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::Other, format!("walk failed: {}", e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if is_temp_file(&name) {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let web_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if web_path == SERVICE_WORKER_FILE {
            continue;
        }
        paths.push(format!("/{}", encode_link_path(&web_path)));
    }

    paths.sort();
    Ok(paths)
}

/// Renders the service worker script for a precache list
pub fn render_service_worker(paths: &[String]) -> String {
    let list = serde_json::to_string(paths).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"self.addEventListener('install', event => {{
  event.waitUntil((async () => {{
    const cache = await caches.open('{cache}');
    await cache.addAll({list});
    self.skipWaiting();
  }})());
}});
self.addEventListener('activate', e => e.waitUntil(self.clients.claim()));
self.addEventListener('fetch', event => {{
  const url = new URL(event.request.url);
  event.respondWith((async () => {{
    const cache = await caches.open('{cache}');
    const match = await cache.match(url.pathname);
    if (match) return match;
    const fallback = await cache.match('/index.html');
    return fallback || Response.error();
  }})());
}});
"#,
        cache = CACHE_NAME,
        list = list
    )
}

/// Lists the output tree and writes `sw.js` at its root
///
/// Returns the number of precached files.
pub fn write_service_worker(root: &Path) -> Result<usize> {
    let paths = list_precache_paths(root)?;
    write_atomic(root, SERVICE_WORKER_FILE, render_service_worker(&paths).as_bytes())?;
    tracing::info!("Wrote {} with {} precached files", SERVICE_WORKER_FILE, paths.len());
    Ok(paths.len())
}
