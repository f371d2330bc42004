//! Sync phase metrics.
//!
//! Counters are recorded through the `metrics` facade; without an installed
//! recorder they are no-ops, so library users and tests pay nothing.

use metrics::counter;
use std::sync::Once;

pub const RECORDS_NORMALIZED: &str = "personio_source_records_normalized_total";
pub const RECORDS_SKIPPED: &str = "personio_source_records_skipped_total";
pub const CACHE_HITS: &str = "personio_source_cache_hits_total";
pub const CACHE_STALE: &str = "personio_source_cache_stale_total";
pub const DOWNLOADS_SUCCESS: &str = "personio_source_downloads_success_total";
pub const DOWNLOADS_ERROR: &str = "personio_source_downloads_error_total";
pub const ATTACHMENTS_FAILED: &str = "personio_source_attachments_failed_total";
pub const LINKS_CREATED: &str = "personio_source_links_created_total";

static REGISTER: Once = Once::new();

pub struct SyncMetrics;

impl SyncMetrics {
    /// Touch every counter once so exported snapshots list them even at zero.
    pub fn register_metrics() {
        REGISTER.call_once(|| {
            for name in Self::names() {
                let _ = counter!(name);
            }
        });
    }

    pub fn names() -> [&'static str; 8] {
        [
            RECORDS_NORMALIZED,
            RECORDS_SKIPPED,
            CACHE_HITS,
            CACHE_STALE,
            DOWNLOADS_SUCCESS,
            DOWNLOADS_ERROR,
            ATTACHMENTS_FAILED,
            LINKS_CREATED,
        ]
    }

    pub fn records_normalized(count: usize) {
        counter!(RECORDS_NORMALIZED).increment(count as u64);
    }

    pub fn records_skipped(count: usize) {
        counter!(RECORDS_SKIPPED).increment(count as u64);
    }

    pub fn cache_hit() {
        counter!(CACHE_HITS).increment(1);
    }

    pub fn cache_stale() {
        counter!(CACHE_STALE).increment(1);
    }

    pub fn download_success() {
        counter!(DOWNLOADS_SUCCESS).increment(1);
    }

    pub fn download_error() {
        counter!(DOWNLOADS_ERROR).increment(1);
    }

    pub fn attachment_failed() {
        counter!(ATTACHMENTS_FAILED).increment(1);
    }

    pub fn link_created() {
        counter!(LINKS_CREATED).increment(1);
    }
}
