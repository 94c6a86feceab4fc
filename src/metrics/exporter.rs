use std::io::Write;

use crate::metrics::snapshot::{EngineStats, QueryCacheMetricsSnapshot};
use crate::metrics::traits::MetricsExporter;

#[cfg(feature = "concurrency")]
type WriterLock<W> = parking_lot::Mutex<W>;
#[cfg(not(feature = "concurrency"))]
type WriterLock<W> = std::sync::Mutex<W>;

/// Prometheus text exporter for engine statistics.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// or forwarded to an OpenTelemetry collector.
///
/// ```
/// use glyphkit::metrics::exporter::PrometheusTextExporter;
/// use glyphkit::metrics::snapshot::EngineStats;
/// use glyphkit::metrics::traits::MetricsExporter;
///
/// let exporter = PrometheusTextExporter::new("glyphkit", Vec::new());
/// exporter.export(&EngineStats { hits: 2, ..EngineStats::default() });
///
/// let text = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(text.contains("glyphkit_hits_total 2"));
/// ```
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: WriterLock<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: WriterLock::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        #[cfg(feature = "concurrency")]
        {
            self.writer.into_inner()
        }
        #[cfg(not(feature = "concurrency"))]
        {
            self.writer
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    fn write_sample(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        #[cfg(feature = "concurrency")]
        let mut writer = self.writer.lock();
        #[cfg(not(feature = "concurrency"))]
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Export is best effort; a failing sink must not fail the caller.
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_sample("counter", suffix, value);
    }

    fn write_gauge(&self, suffix: &str, value: u64) {
        self.write_sample("gauge", suffix, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<EngineStats> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &EngineStats) {
        self.write_counter("hits_total", snapshot.hits);
        self.write_counter("misses_total", snapshot.misses);
        self.write_counter("evictions_total", snapshot.evictions);
        self.write_counter("expirations_total", snapshot.expirations);
        self.write_counter("invalidations_total", snapshot.invalidations);
        self.write_counter("index_lookups_total", snapshot.index_lookups);
        self.write_counter("full_scans_total", snapshot.full_scans);
        self.write_counter("dataset_replacements_total", snapshot.dataset_replacements);
        self.write_counter("replace_failures_total", snapshot.replace_failures);
        self.write_counter("warmup_queries_total", snapshot.warmup_queries);
        self.write_gauge("cache_size", snapshot.current_size as u64);
        self.write_gauge("capacity", snapshot.capacity as u64);
        self.write_gauge("ttl_seconds", snapshot.ttl_seconds);
        self.write_gauge("enabled", u64::from(snapshot.enabled));
        self.write_gauge("dataset_generation", snapshot.dataset_generation);
        self.write_gauge("records", snapshot.record_count as u64);
    }
}

impl<W: Write + Send> MetricsExporter<QueryCacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &QueryCacheMetricsSnapshot) {
        self.write_counter("get_calls_total", snapshot.get_calls);
        self.write_counter("get_hits_total", snapshot.get_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("insert_new_total", snapshot.insert_new);
        self.write_counter("insert_updates_total", snapshot.insert_updates);
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_counter("expired_entries_total", snapshot.expired_entries);
        self.write_counter("invalidated_entries_total", snapshot.invalidated_entries);
        self.write_gauge("cache_len", snapshot.cache_len as u64);
        self.write_gauge("capacity", snapshot.capacity as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_stats_are_written_with_types() {
        let exporter = PrometheusTextExporter::new("glyphs", Vec::new());
        exporter.export(&EngineStats {
            misses: 4,
            enabled: true,
            ..EngineStats::default()
        });
        let text = String::from_utf8(exporter.into_inner()).unwrap();

        assert!(text.contains("# TYPE glyphs_misses_total counter"));
        assert!(text.contains("glyphs_misses_total 4"));
        assert!(text.contains("# TYPE glyphs_enabled gauge"));
        assert!(text.contains("glyphs_enabled 1"));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let exporter = PrometheusTextExporter::new("", Vec::new());
        exporter.export(&QueryCacheMetricsSnapshot {
            cache_len: 7,
            ..QueryCacheMetricsSnapshot::default()
        });
        let text = String::from_utf8(exporter.into_inner()).unwrap();

        assert!(text.lines().any(|line| line == "cache_len 7"));
    }
}
