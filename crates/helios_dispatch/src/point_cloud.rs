//! Concurrent point-cloud collector and PLY export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use helios_core::PointSample;

use crate::error::ExportError;

/// Append-only buffer of 3D samples gathered while rendering.
///
/// Appends happen at scanline granularity, not per pixel, so a single
/// mutex around the buffer is cheap. Export and rendering are
/// mutually exclusive; the master enforces that, not this type.
#[derive(Debug, Default)]
pub struct PointCloud {
    entries: Mutex<Vec<PointSample>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all samples (start of a new collecting session).
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Append a single sample.
    pub fn append(&self, sample: PointSample) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }

    /// Append one worker's batch of samples.
    pub fn extend(&self, batch: Vec<PointSample>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(batch);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the current samples.
    pub fn snapshot(&self) -> Vec<PointSample> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write all samples as ASCII PLY (position floats + uchar color).
    ///
    /// Returns the number of exported samples.
    pub fn export_ply(&self, path: &Path) -> Result<usize, ExportError> {
        let entries = self.snapshot();
        if entries.is_empty() {
            return Err(ExportError::Empty);
        }

        let file = File::create(path)?;
        let mut out = BufWriter::new(file);

        writeln!(out, "ply")?;
        writeln!(out, "format ascii 1.0")?;
        writeln!(out, "element vertex {}", entries.len())?;
        writeln!(out, "property float x")?;
        writeln!(out, "property float y")?;
        writeln!(out, "property float z")?;
        writeln!(out, "property uchar red")?;
        writeln!(out, "property uchar green")?;
        writeln!(out, "property uchar blue")?;
        writeln!(out, "end_header")?;

        for sample in &entries {
            writeln!(
                out,
                "{} {} {} {} {} {}",
                sample.position.x,
                sample.position.y,
                sample.position.z,
                sample.color.r,
                sample.color.g,
                sample.color.b
            )?;
        }
        out.flush()?;

        log::info!("exported {} point samples to {}", entries.len(), path.display());
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helios_core::Rgb8;
    use helios_math::Vec3;
    use std::sync::Arc;
    use std::thread;

    fn sample(i: usize) -> PointSample {
        PointSample::new(Vec3::new(i as f32, 0.0, 0.0), Rgb8::new(1, 2, 3))
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let cloud = Arc::new(PointCloud::new());
        let writers = 8;
        let batches = 50;
        let batch_len = 16;

        let handles: Vec<_> = (0..writers)
            .map(|_| {
                let cloud = cloud.clone();
                thread::spawn(move || {
                    for _ in 0..batches {
                        cloud.extend((0..batch_len).map(sample).collect());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cloud.len(), writers * batches * batch_len);
    }

    #[test]
    fn test_export_empty_is_an_error() {
        let cloud = PointCloud::new();
        let path = std::env::temp_dir().join("helios_empty.ply");
        assert!(matches!(
            cloud.export_ply(&path),
            Err(ExportError::Empty)
        ));
    }

    #[test]
    fn test_export_ply_shape() {
        let cloud = PointCloud::new();
        cloud.extend(vec![
            PointSample::new(Vec3::new(1.5, 2.0, -3.0), Rgb8::new(10, 20, 30)),
            PointSample::new(Vec3::ZERO, Rgb8::new(255, 0, 0)),
        ]);

        let path = std::env::temp_dir().join(format!("helios_cloud_{}.ply", std::process::id()));
        let count = cloud.export_ply(&path).unwrap();
        assert_eq!(count, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ply");
        assert_eq!(lines[2], "element vertex 2");
        assert_eq!(lines[9], "end_header");
        assert_eq!(lines[10], "1.5 2 -3 10 20 30");
        assert_eq!(lines.len(), 12);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_clear() {
        let cloud = PointCloud::new();
        cloud.append(sample(0));
        assert!(!cloud.is_empty());
        cloud.clear();
        assert!(cloud.is_empty());
    }
}
